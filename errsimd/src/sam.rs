/**
 * file: sam.rs
 * desc: Read SAM records and feed them to a count accumulator.
 */
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use noodles::sam;
use noodles::sam::record::data::field::tag;
use tracing::{info, warn};

use shared::error::Result;
use shared::nucleotide::Orientation;
use shared::util;

use crate::alignment::{self, AlignmentRecord};
use crate::fit::FitConfig;
use crate::matrix::CountAccumulator;

/**
 * STRUCTS
 */

/**
 * Tally of what happened to each SAM record.
 */
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SamSummary {
    pub records: usize,
    pub used: usize,
    pub with_indels: usize,
    pub secondary: usize,
    pub missing_sequence: usize,
    pub unmapped_read: usize,
    pub low_mapq: usize,
    pub unmapped_mate: usize,
    pub missing_md: usize,
    pub malformed: usize,
    pub large_inserts: usize,
}

impl SamSummary {
    pub fn log(&self) {
        info!("Parsed {} records", self.records);
        info!("Using {} alignments ({} with indels)", self.used, self.with_indels);
        info!("Skipped {} secondary or supplementary alignments", self.secondary);
        info!("Skipped {} alignments that were missing sequences", self.missing_sequence);
        info!("Skipped {} alignments where the read was unmapped", self.unmapped_read);
        info!("Skipped {} alignments below the MAPQ threshold", self.low_mapq);
        info!("Skipped {} alignments where the mate was unmapped", self.unmapped_mate);
        info!("Skipped {} alignments that were missing the MD tag", self.missing_md);
        info!("Skipped {} alignments that could not be reconstructed", self.malformed);
        info!("Ignored {} insert sizes above the maximum", self.large_inserts);
    }
}

/**
 * FUNCTIONS
 */

// Forward covers mate 1 and unpaired reads
fn record_orientation(flags: sam::record::Flags) -> Orientation {
    if flags.is_segmented() && flags.is_last_segment() {
        Orientation::Reverse
    } else {
        Orientation::Forward
    }
}

/**
 * Stream the SAM file through a fresh accumulator. Quality scores and read lengths are
 * collected from every primary record with a sequence, unmapped reads included. Mismatch
 * and indel counts only come from mapped reads that pass the filters and carry an MD tag.
 *
 * args
 *  path:   SAM file
 *  config: fitting settings
 *
 * returns
 *  the filled accumulator and a summary of the records that were skipped
 */
pub fn accumulate_alignments(
    path: &Path,
    config: &FitConfig,
) -> Result<(CountAccumulator, SamSummary)> {
    let mut sam_reader = File::open(path).map(BufReader::new).map(sam::Reader::new)?;
    let sam_header = sam_reader.read_header()?;

    let mut acc = config.accumulator();
    let mut summary = SamSummary::default();

    info!("Parsing {}", path.display());

    for (i, res) in sam_reader.records(&sam_header).enumerate() {
        // Stop collecting alignments if necessary
        if config.max_alignments.map_or(false, |max| i >= max) {
            break;
        }

        if (i % 250_000) == 0 && i > 0 {
            info!("Processed {} records", i);
        }

        let record = res?;
        let flags = record.flags();

        summary.records += 1;

        if flags.is_secondary() || flags.is_supplementary() {
            summary.secondary += 1;
            continue;
        }

        let seq = record.sequence().to_string().as_bytes().to_vec();

        // If a sequence isn't provided, skip. Probably an alignment w/ MAPQ == 0
        if seq.is_empty() {
            summary.missing_sequence += 1;
            continue;
        }

        let orientation = record_orientation(flags);
        let mut qualities: Vec<u8> = record
            .quality_scores()
            .as_ref()
            .iter()
            .map(|score| u8::from(*score))
            .collect();

        // Qualities are kept in sequencing order
        if flags.is_reverse_complemented() {
            qualities.reverse();
        }

        if !qualities.is_empty() {
            acc.add_qualities(qualities, orientation);
        }

        acc.add_read_length(seq.len());

        // Skip unmapped reads, these are only used for quality distributions
        if flags.is_unmapped() {
            summary.unmapped_read += 1;
            continue;
        }

        let mapq = record.mapping_quality().map(|q| q.get()).unwrap_or(0);

        if mapq == 0 || config.mapq_threshold.map_or(false, |t| mapq < t) {
            summary.low_mapq += 1;
            continue;
        }

        // Template length of zero usually indicates that the mate is unmapped
        if !config.single_reads && record.template_length() == 0 && flags.is_mate_unmapped() {
            summary.unmapped_mate += 1;
            continue;
        }

        // MD tag is required
        let md_tag = match record
            .data()
            .get(&tag::MISMATCHED_POSITIONS)
            .and_then(|t| t.as_str())
        {
            Some(t) => t.as_bytes().to_vec(),
            None => {
                warn!(
                    "Read ({}) alignment is missing the MD tag",
                    record
                        .read_name()
                        .map(|n| util::bytes_to_string(n.as_ref()))
                        .unwrap_or_default()
                );
                summary.missing_md += 1;
                continue;
            }
        };

        // Regenerate the raw CIGAR string from the alignment record
        let cigar: Vec<u8> = record
            .cigar()
            .iter()
            .flat_map(|op| format!("{}{}", op.len(), char::from(op.kind())).into_bytes())
            .collect();

        let aligned = alignment::parse_cigar(&cigar)
            .and_then(|c| AlignmentRecord::from_parts(c, &md_tag, &seq));

        let aligned = match aligned {
            // Reads on the reverse strand are counted in the order their bases were
            // sequenced, the same order as their qualities
            Ok(a) if flags.is_reverse_complemented() => a.reverse_complement(),
            Ok(a) => a,
            Err(e) => {
                warn!("Skipping alignment: {}", e);
                summary.malformed += 1;
                continue;
            }
        };

        if acc.add_alignment(&aligned, orientation) {
            summary.with_indels += 1;
        }
        summary.used += 1;

        // It's possible to have negative insert sizes if the first read is mapped to the
        // reverse strand. Pairs are counted once, from mate 1.
        let insert_size = record.template_length().unsigned_abs();

        if !config.single_reads && flags.is_first_segment() && insert_size > 0 {
            // There are some alignments with enormous insert sizes, skip these b/c they
            // distort the distribution
            if insert_size > config.max_insert_size {
                summary.large_inserts += 1;
            } else {
                acc.add_insert_size(insert_size);
            }
        }
    }

    Ok((acc, summary))
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::dispatch::SubstitutionCategory;
    use std::io::Write;

    const SAM: &str = "\
@HD\tVN:1.6\tSO:unsorted
@SQ\tSN:chr1\tLN:1000
r1\t99\tchr1\t1\t60\t5M\t=\t100\t150\tACGTA\tIIIII\tMD:Z:1T3
r1\t147\tchr1\t100\t60\t5M\t=\t1\t-150\tTTTTT\tIIII5\tMD:Z:5
r2\t99\tchr1\t1\t0\t5M\t=\t100\t150\tACGTA\tIIIII\tMD:Z:5
r3\t4\t*\t0\t0\t*\t*\t0\t0\tACGTA\t55555
r4\t0\tchr1\t1\t60\t2M1I2M\t*\t0\t0\tACGTA\tIIIII\tMD:Z:4
r5\t0\tchr1\t1\t60\t5M\t*\t0\t0\tACGTA\tIIIII
r6\t256\tchr1\t1\t60\t5M\t*\t0\t0\tACGTA\tIIIII\tMD:Z:5
";

    fn write_sam(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(SAM.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_accumulate_alignments() {
        let path = write_sam("errsimd-sam-test.sam");
        let config = FitConfig::default();

        let (acc, summary) = accumulate_alignments(&path, &config).unwrap();

        assert_eq!(summary.records, 7);
        assert_eq!(summary.secondary, 1);
        assert_eq!(summary.unmapped_read, 1);
        assert_eq!(summary.low_mapq, 1);
        assert_eq!(summary.missing_md, 1);
        assert_eq!(summary.used, 3);
        assert_eq!(summary.with_indels, 1);

        // Qualities from r1 mate 1, r2, r3, r4 and r5 are forward
        assert_eq!(acc.counts(Orientation::Forward).qualities.len(), 5);
        // Mate 2 is reverse complemented, its qualities are flipped back
        assert_eq!(
            acc.counts(Orientation::Reverse).qualities,
            vec![vec![20, 40, 40, 40, 40]]
        );
        assert_eq!(acc.insert_sizes, vec![150.0]);
        assert_eq!(acc.read_lengths.len(), 6);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_reverse_strand_reads_are_counted_in_sequencing_order() {
        // Read ACGTC on the reverse strand, its last aligned base is a low quality mismatch
        let path = std::env::temp_dir().join("errsimd-sam-reverse-test.sam");
        let mut f = File::create(&path).unwrap();
        f.write_all(
            b"@HD\tVN:1.6\tSO:unsorted\n\
              @SQ\tSN:chr1\tLN:1000\n\
              r1\t16\tchr1\t1\t60\t5M\t*\t0\t0\tACGTC\tIIII#\tMD:Z:4A0\n",
        )
        .unwrap();

        let (acc, summary) = accumulate_alignments(&path, &FitConfig::default()).unwrap();
        let counts = acc.counts(Orientation::Forward);

        assert_eq!(summary.used, 1);
        // The mismatch and its quality are both the first sequenced base
        assert_eq!(counts.qualities, vec![vec![2, 40, 40, 40, 40]]);
        assert_eq!(counts.substitutions.get(0, SubstitutionCategory::TToG.code()), 1);
        assert_eq!(counts.substitutions.get(4, SubstitutionCategory::AToC.code()), 0);
        // Remaining bases in sequencing order are ACGT
        assert_eq!(counts.substitutions.get(1, SubstitutionCategory::MatchA.code()), 1);
        assert_eq!(counts.substitutions.get(4, SubstitutionCategory::MatchT.code()), 1);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_max_alignments_stops_early() {
        let path = write_sam("errsimd-sam-max-test.sam");
        let config = FitConfig {
            max_alignments: Some(2),
            ..FitConfig::default()
        };

        let (_, summary) = accumulate_alignments(&path, &config).unwrap();

        assert_eq!(summary.records, 2);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let res = accumulate_alignments(Path::new("/nonexistent/x.sam"), &FitConfig::default());

        assert!(res.is_err());
    }
}
