/**
 * file: fastq.rs
 * desc: Write simulated reads to a pair of FASTQ files.
 */
use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use shared::error::Result;
use shared::util;

use crate::simulate::{SimulatedRead, SingleRead};

/**
 * Fill out a read header using the header format. Supported fields:
 *
 *  {:read_id:}  the read ID
 *  {:seq_id:}   ID of the sequence the read was simulated from
 *  {:pair:}     pair number, 1 or 2
 */
pub fn format_header(header_format: &str, read: &SimulatedRead, pair: u8) -> String {
    let header = header_format
        .replace("{:read_id:}", &read.id.to_string())
        .replace(
            "{:seq_id:}",
            &util::bytes_to_string(&read.metadata.sequence_id),
        )
        .replace("{:pair:}", &pair.to_string());

    if header.starts_with('@') {
        header
    } else {
        format!("@{}", header)
    }
}

fn write_record<W: Write>(writer: &mut W, header: &str, read: &SingleRead) -> Result<()> {
    writer.write_all(header.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.write_all(&read.sequence)?;
    writer.write_all(b"\n+\n")?;
    writer.write_all(&util::encode_quality_scores(&read.quality))?;
    writer.write_all(b"\n")?;

    Ok(())
}

/**
 * Write forward reads to <prefix>_R1.fastq and reverse reads to <prefix>_R2.fastq. Existing
 * files are overwritten.
 *
 * args
 *  reads:         simulated PE reads
 *  output_prefix: prefix for both output files
 *  header_format: read header format, see format_header
 *
 * returns
 *  the R1 and R2 filepaths
 */
pub fn write_fastq_pairs(
    reads: &[SimulatedRead],
    output_prefix: &str,
    header_format: &str,
) -> Result<(PathBuf, PathBuf)> {
    let r1_path = PathBuf::from(format!("{}_R1.fastq", output_prefix));
    let r2_path = PathBuf::from(format!("{}_R2.fastq", output_prefix));
    let mut r1 = BufWriter::new(fs::File::create(&r1_path)?);
    let mut r2 = BufWriter::new(fs::File::create(&r2_path)?);

    for read in reads.iter() {
        write_record(&mut r1, &format_header(header_format, read, 1), &read.forward)?;
        write_record(&mut r2, &format_header(header_format, read, 2), &read.reverse)?;
    }

    r1.flush()?;
    r2.flush()?;

    Ok((r1_path, r2_path))
}
