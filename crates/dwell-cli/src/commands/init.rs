//! Init command for provisioning the user identity.

use std::io::Write;

use anyhow::Result;

use crate::{Config, identity};

/// Runs the init command.
pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let identity = identity::init_at(&config.identity_path)?;

    writeln!(writer, "User ID:  {}", identity.user_id)?;
    writeln!(writer, "Saved to: {}", config.identity_path.display())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_reports_same_id_twice() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            identity_path: temp.path().join("identity.json"),
            ..Config::default()
        };

        let mut first = Vec::new();
        run(&mut first, &config).unwrap();
        let mut second = Vec::new();
        run(&mut second, &config).unwrap();

        let first = String::from_utf8(first).unwrap();
        assert!(first.starts_with("User ID:  user-"));
        assert_eq!(first, String::from_utf8(second).unwrap());
    }
}
