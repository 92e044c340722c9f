/**
 * file: encoding.rs
 * desc: Model archive serialization.
 */
use bincode;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::profile::ErrorProfile;

/**
 * Uses bincode to serialize a fitted profile and write it to the given output. An existing
 * file at the path is replaced.
 */
pub fn serialize_profile_to_path(filepath: &Path, profile: &ErrorProfile) -> Result<()> {
    // Serialize into a binary format
    let bytes = bincode::serialize(profile)?;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(filepath)?;

    file.write_all(&bytes)?;

    Ok(())
}

/**
 * Deserialize a model archive into a profile. The profile is validated before it is
 * returned so a truncated or hand-edited archive is rejected here rather than at sampling
 * time.
 */
pub fn deserialize_profile_from_path(filepath: &Path) -> Result<ErrorProfile> {
    let bytes = fs::read(filepath)?;

    let profile: ErrorProfile = bincode::deserialize(&bytes)?;

    profile.validate()?;

    Ok(profile)
}
