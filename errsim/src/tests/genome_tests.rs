/**
 * file: genome_tests.rs
 * desc: Genome struct and fasta parsing tests.
 */
use std::path::PathBuf;

use shared::error::ModelError;

use crate::genome;

fn write_fasta(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("errsim-{}-{}.fna", std::process::id(), name));

    std::fs::write(&path, contents).unwrap();

    path
}

#[test]
fn test_genome_from_fasta() {
    let path = write_fasta(
        "genome",
        ">header1 first record\nACGTacgtNN\nGGCC\n>header2\nttttRYaa\n",
    );
    let genome = genome::Genome::from_fasta(&path).unwrap();

    assert_eq!(genome.filepath, path);
    assert_eq!(genome.sequence.len(), 2);
    assert_eq!(genome.size, 22);

    assert_eq!(genome.sequence[0].name(), "header1 first record");
    assert_eq!(genome.sequence[0].seq, b"ACGTACGTNNGGCC".to_vec());
    assert_eq!(genome.sequence[0].size, 14);

    assert_eq!(genome.sequence[1].name(), "header2");
    assert_eq!(genome.sequence[1].seq, b"TTTTNNAA".to_vec());

    assert_eq!(genome.usable_sequences(10).len(), 1);
    assert_eq!(genome.usable_sequences(8).len(), 2);
    assert!(genome.usable_sequences(15).is_empty());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_fasta() {
    let res = genome::Genome::from_fasta(&std::env::temp_dir().join("errsim-missing.fna"));

    assert!(matches!(res, Err(ModelError::InvalidFasta(_))));
}
