/**
 * file: cli.rs
 * desc: CLI parsing.
 */
use clap::{ArgEnum, Parser};

use crate::error_model::MutationRule;
use crate::simulate::SimulationOptions;

/**
 * HELP DESCRIPTIONS
 */

static MUTATION_RULE_HELP: &str = "
How a base's quality score decides whether it is substituted

<error-probability>  substitute when a uniform draw falls below the base's error
                     probability, low quality bases mutate more often
<legacy>             substitute when the draw exceeds the error probability
";

static READ_FORMAT_HELP: &str = "
Header format for simulated reads. Supports some string interpolation via usage of the
following fields:

    {:read_id:}  replaced by the unique read ID
    {:seq_id:}   replaced by the ID of the sequence the read is derived from
    {:pair:}     replaced by the pair number 1 or 2

";

/**
 * STRUCTS
 */

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ArgEnum)]
pub enum MutationRuleArg {
    ErrorProbability,
    Legacy,
}

impl From<MutationRuleArg> for MutationRule {
    fn from(arg: MutationRuleArg) -> Self {
        match arg {
            MutationRuleArg::ErrorProbability => MutationRule::ErrorProbability,
            MutationRuleArg::Legacy => MutationRule::Legacy,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(version, about, long_about = None)]
pub struct CliArgs {
    #[clap(long, value_parser, help = "Error model built by errsimd")]
    pub model: String,

    #[clap(long, value_parser, help = "Filepath to a genome to use for simulations")]
    pub genome: String,

    // FASTQ output
    #[clap(
        long,
        value_parser,
        help = "Output prefix, reads are written to <PREFIX>_R1.fastq and <PREFIX>_R2.fastq"
    )]
    pub output: String,

    #[clap(
        long,
        default_value_t = 1000,
        value_parser,
        help = "Number of PE reads to simulate"
    )]
    pub num_reads: usize,

    #[clap(long, value_parser, help = "Random seed")]
    pub seed: Option<u64>,

    #[clap(
        long,
        arg_enum,
        default_value_t = MutationRuleArg::ErrorProbability,
        value_parser,
        help = MUTATION_RULE_HELP
    )]
    pub mutation_rule: MutationRuleArg,

    #[clap(
        long,
        value_parser,
        default_value_t = false,
        help = "Introduce insertions and deletions in addition to substitutions"
    )]
    pub indels: bool,

    #[clap(
        long,
        default_value = "@{:read_id:}|{:seq_id:}/{:pair:}",
        value_parser,
        help = READ_FORMAT_HELP
    )]
    pub read_header_format: String,

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
    pub fn simulation_options(&self) -> SimulationOptions {
        SimulationOptions {
            indels: self.indels,
        }
    }
}

/**
 * FUNCTIONS
 */

pub fn parse_cli_args() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from([
            "errsim", "--model", "model", "--genome", "g.fna", "--output", "out",
        ]);

        assert_eq!(args.num_reads, 1000);
        assert_eq!(args.seed, None);
        assert_eq!(
            MutationRule::from(args.mutation_rule),
            MutationRule::ErrorProbability
        );
        assert_eq!(args.simulation_options(), SimulationOptions::default());
        assert_eq!(args.read_header_format, "@{:read_id:}|{:seq_id:}/{:pair:}");
    }

    #[test]
    fn test_simulation_flags() {
        let args = CliArgs::parse_from([
            "errsim",
            "--model",
            "model",
            "--genome",
            "g.fna",
            "--output",
            "out",
            "--mutation-rule",
            "legacy",
            "--indels",
            "--seed",
            "42",
        ]);

        assert_eq!(MutationRule::from(args.mutation_rule), MutationRule::Legacy);
        assert!(args.simulation_options().indels);
        assert_eq!(args.seed, Some(42));
    }

    #[test]
    fn test_model_is_required() {
        assert!(CliArgs::try_parse_from(["errsim", "--genome", "g.fna", "--output", "out"])
            .is_err());
    }
}
