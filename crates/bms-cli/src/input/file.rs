use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON or YAML file into a typed struct. `.yaml` and `.yml` files
/// are parsed as YAML, everything else as JSON.
pub fn read_structured<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = if is_yaml(&canonical) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(value)
}

/// Write `value` back in the format the file extension names.
pub fn write_structured<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = if is_yaml(&canonical) {
        serde_yaml::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    fs::write(&canonical, contents)
        .map_err(|e| format!("Failed to write '{}': {}", canonical.display(), e))?;
    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    #[test]
    fn test_yaml_and_json_read_alike() {
        let dir = std::env::temp_dir();
        let json = dir.join(format!("bms-cli-{}.json", std::process::id()));
        let yaml = dir.join(format!("bms-cli-{}.yaml", std::process::id()));
        fs::write(&json, r#"{"amount": "10000", "termMonths": "12"}"#).unwrap();
        fs::write(&yaml, "amount: '10000'\ntermMonths: '12'\n").unwrap();

        let a: Value = read_structured(json.to_str().unwrap()).unwrap();
        let b: Value = read_structured(yaml.to_str().unwrap()).unwrap();
        assert_eq!(a, b);

        let _ = fs::remove_file(json);
        let _ = fs::remove_file(yaml);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = read_structured::<Value>("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }
}
