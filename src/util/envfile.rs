use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Parsed `.env` content. Lines that could not be parsed are reported in
/// `skipped` rather than logged, since `.env` is read before logging exists.
#[derive(Debug, Default)]
pub struct EnvFile {
    pub vars: HashMap<String, String>,
    pub skipped: Vec<String>,
}

fn parse_env_content(content: &str) -> EnvFile {
    let mut out = EnvFile::default();
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        if let Some(eq) = s.find('=') {
            let key = s[..eq].trim();
            let mut val = s[eq + 1..].trim().to_string();
            if val.len() >= 2
                && ((val.starts_with('"') && val.ends_with('"'))
                    || (val.starts_with('\'') && val.ends_with('\'')))
            {
                val = val[1..val.len() - 1].to_string();
            }
            out.vars.insert(key.to_string(), val);
        } else {
            out.skipped
                .push(format!("Ignoring .env line {} without '=': {}", idx + 1, line));
        }
    }
    out
}

/// Parse a .env file, if present. Does not modify the process environment.
pub fn parse_env_file_at(path: &Path) -> Result<EnvFile> {
    if !path.exists() {
        return Ok(EnvFile::default());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(parse_env_content(&content))
}

/// Load a .env file into the process environment without overriding
/// variables that are already set. Returns the warnings for skipped lines.
pub fn load_dotenv_from(path: &Path) -> Result<Vec<String>> {
    let parsed = parse_env_file_at(path)?;
    for (k, v) in parsed.vars {
        if std::env::var_os(&k).is_none() {
            unsafe {
                std::env::set_var(&k, &v);
            }
        }
    }
    Ok(parsed.skipped)
}

/// [`load_dotenv_from`] on `.env` in the working directory.
pub fn load_dotenv_if_present() -> Result<Vec<String>> {
    load_dotenv_from(Path::new(".env"))
}

/// Generate a .env.template file with placeholder values and comments.
pub fn write_env_template(path: &str) -> Result<()> {
    let mut f = fs::File::create(path).with_context(|| format!("Failed to create {}", path))?;
    let template = r#"# name_resolver environment configuration template
# Copy this file to .env and fill in your database connection settings.
# Any of these variables can also be provided via the system environment.

DB_HOST=127.0.0.1
DB_PORT=3306
DB_USER=root
DB_PASSWORD=secret
DB_NAME=names

# Reference table (default name_types)
#NAME_RESOLVER_TABLE=name_types

# Matching (optional)
#NAME_RESOLVER_THRESHOLD=0.8
#NAME_RESOLVER_CASCADE_STEPS=1

# Pool / logging (optional)
#NAME_RESOLVER_POOL_SIZE=8
#NAME_RESOLVER_ACQUIRE_MS=30000
#NAME_RESOLVER_PLAIN_LOG=1
#RUST_LOG=info
"#;
    f.write_all(template.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quotes_comments_and_junk() {
        let parsed = parse_env_content(
            "# comment\nDB_HOST = localhost\nDB_PASSWORD=\"p=w\"\nQUOTE='x'\nbroken line\n\n",
        );
        let map = &parsed.vars;
        assert_eq!(map.get("DB_HOST").map(String::as_str), Some("localhost"));
        assert_eq!(map.get("DB_PASSWORD").map(String::as_str), Some("p=w"));
        assert_eq!(map.get("QUOTE").map(String::as_str), Some("x"));
        assert_eq!(map.len(), 3);
        assert_eq!(parsed.skipped.len(), 1);
        assert!(parsed.skipped[0].contains("line 5"));
    }

    #[test]
    fn missing_file_is_empty() {
        let parsed = parse_env_file_at(Path::new("/no/such/.env")).unwrap();
        assert!(parsed.vars.is_empty());
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn dotenv_fills_unset_vars_and_returns_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "NAME_RESOLVER_ENVFILE_FRESH=debug\nNAME_RESOLVER_ENVFILE_KEPT=file\nnot a pair\n",
        )
        .unwrap();
        unsafe {
            std::env::set_var("NAME_RESOLVER_ENVFILE_KEPT", "process");
        }
        let skipped = load_dotenv_from(&path).unwrap();
        assert_eq!(
            std::env::var("NAME_RESOLVER_ENVFILE_FRESH").as_deref(),
            Ok("debug")
        );
        assert_eq!(
            std::env::var("NAME_RESOLVER_ENVFILE_KEPT").as_deref(),
            Ok("process")
        );
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn template_round_trips_through_parser() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.template");
        write_env_template(path.to_str().unwrap()).unwrap();
        let map = parse_env_file_at(&path).unwrap().vars;
        assert_eq!(map.get("DB_PORT").map(String::as_str), Some("3306"));
        assert!(!map.contains_key("NAME_RESOLVER_THRESHOLD"));
    }
}
