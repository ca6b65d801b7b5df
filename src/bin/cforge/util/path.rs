use std::path::{Path, PathBuf};

/// Replaces the file name with `<stem><suffix>`, dropping the original
/// extension.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();
    path.with_file_name(format!("{}{}", stem.to_string_lossy(), suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_extension_for_suffix() {
        let out = with_suffix(Path::new("mols/aspirin.sdf"), "_conf.sdf");
        assert_eq!(out, PathBuf::from("mols/aspirin_conf.sdf"));
    }

    #[test]
    fn handles_extensionless_input() {
        let out = with_suffix(Path::new("aspirin"), "_conf.sdf");
        assert_eq!(out, PathBuf::from("aspirin_conf.sdf"));
    }
}
