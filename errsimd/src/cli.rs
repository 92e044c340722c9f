/**
 * file: cli.rs
 * desc: CLI parsing.
 */
use clap::{ArgEnum, Parser};

use crate::dispatch::DeletionCursor;
use crate::fit::{FitConfig, DEFAULT_MAX_INSERT_SIZE};
use crate::matrix::DEFAULT_MAX_READ_LENGTH;

/**
 * STRUCTS
 */

/**
 * How the read position moves over a deletion, see DeletionCursor.
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ArgEnum)]
pub enum DeletionCursorArg {
    Retreat,
    Hold,
}

impl From<DeletionCursorArg> for DeletionCursor {
    fn from(arg: DeletionCursorArg) -> Self {
        match arg {
            DeletionCursorArg::Retreat => DeletionCursor::Retreat,
            DeletionCursorArg::Hold => DeletionCursor::Hold,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(version, about, long_about = None)]
pub struct CliArgs {
    #[clap(long, value_parser, help = "SAM file")]
    pub sam_file: String,

    #[clap(long, value_parser, help = "Output file for the fitted error model")]
    pub output: String,

    #[clap(
        long,
        value_parser,
        help = "Use a maximum of N alignments for distribution modeling"
    )]
    pub max_alignments: Option<usize>,

    #[clap(
        long,
        value_parser = valid_read_length,
        default_value_t = DEFAULT_MAX_READ_LENGTH,
        help = "Longest read length the count matrices can hold"
    )]
    pub max_read_length: usize,

    #[clap(
        long,
        value_parser,
        default_value_t = DEFAULT_MAX_INSERT_SIZE,
        help = "Insert sizes above this are left out of the insert size distribution"
    )]
    pub max_insert_size: u32,

    #[clap(
        long,
        value_parser,
        help = "MAPQ threshold, alignments below the threshold will not be used"
    )]
    pub mapq_threshold: Option<u8>,

    #[clap(
        long,
        arg_enum,
        default_value_t = DeletionCursorArg::Retreat,
        value_parser,
        help = "How the read position moves over a deletion when counting indels"
    )]
    pub deletion_cursor: DeletionCursorArg,

    #[clap(
        long,
        value_parser,
        default_value_t = false,
        help = "Alignment contains single ended reads"
    )]
    pub single_reads: bool,

    #[clap(
        long,
        value_parser,
        default_value_t = 1,
        help = "Number of threads to use, a value of 0 uses all available threads"
    )]
    pub threads: usize,

    #[clap(long, value_parser, default_value_t = false, help = "Debug level logging")]
    pub verbose: bool,
}

impl CliArgs {
    pub fn fit_config(&self) -> FitConfig {
        FitConfig {
            max_read_length: self.max_read_length,
            deletion_cursor: self.deletion_cursor.into(),
            max_insert_size: self.max_insert_size,
            mapq_threshold: self.mapq_threshold,
            max_alignments: self.max_alignments,
            single_reads: self.single_reads,
        }
    }
}

/**
 * FUNCTIONS
 */

pub fn parse_cli_args() -> CliArgs {
    CliArgs::parse()
}

fn valid_read_length(s: &str) -> Result<usize, String> {
    let read_length: usize = s
        .parse()
        .map_err(|_| format!("`{}` isn't a valid integer", s))?;

    if read_length > 0 {
        Ok(read_length)
    } else {
        Err("Read length must be at least 1".to_string())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["errsimd", "--sam-file", "in.sam", "--output", "model"]);
        let config = args.fit_config();

        assert_eq!(config, FitConfig::default());
        assert!(!args.verbose);
    }

    #[test]
    fn test_deletion_cursor_and_limits() {
        let args = CliArgs::parse_from([
            "errsimd",
            "--sam-file",
            "in.sam",
            "--output",
            "model",
            "--deletion-cursor",
            "hold",
            "--max-read-length",
            "151",
            "--mapq-threshold",
            "20",
        ]);
        let config = args.fit_config();

        assert_eq!(config.deletion_cursor, DeletionCursor::Hold);
        assert_eq!(config.max_read_length, 151);
        assert_eq!(config.mapq_threshold, Some(20));
    }

    #[test]
    fn test_zero_read_length_is_rejected() {
        let res = CliArgs::try_parse_from([
            "errsimd",
            "--sam-file",
            "in.sam",
            "--output",
            "model",
            "--max-read-length",
            "0",
        ]);

        assert!(res.is_err());
    }
}
