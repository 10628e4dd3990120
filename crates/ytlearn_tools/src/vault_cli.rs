#![forbid(unsafe_code)]

use ytlearn_engines::device_vault::{DeviceVault, SecretId};

pub fn execute_vault_command(
    vault: &DeviceVault,
    subcommand: &str,
    secret_id: Option<&str>,
    value: Option<&str>,
) -> Result<String, String> {
    match subcommand {
        "set" => {
            let id = require_secret_id(secret_id)?;
            let raw = value.ok_or_else(|| "missing secret input value".to_string())?;
            vault
                .set_secret(id, raw)
                .map_err(|e| format!("failed to store secret: {e}"))?;
            Ok("OK".to_string())
        }
        "has" => {
            let id = require_secret_id(secret_id)?;
            let has = vault
                .has_secret(id)
                .map_err(|e| format!("failed to check secret: {e}"))?;
            Ok(if has { "YES" } else { "NO" }.to_string())
        }
        "del" => {
            let id = require_secret_id(secret_id)?;
            let removed = vault
                .delete_secret(id)
                .map_err(|e| format!("failed to delete secret: {e}"))?;
            Ok(if removed { "OK" } else { "ABSENT" }.to_string())
        }
        _ => Err(format!(
            "unknown vault subcommand: {subcommand}. expected one of: set, has, del"
        )),
    }
}

pub fn parse_secret_id(raw: &str) -> Result<SecretId, String> {
    SecretId::parse(raw).ok_or_else(|| format!("unknown secret id '{raw}'. allowed: {}", allowed()))
}

fn require_secret_id(raw: Option<&str>) -> Result<SecretId, String> {
    let raw = raw.ok_or_else(|| format!("missing secret id. allowed: {}", allowed()))?;
    parse_secret_id(raw)
}

fn allowed() -> String {
    SecretId::ALL
        .iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_vault() -> (tempfile::TempDir, DeviceVault) {
        let dir = tempfile::tempdir().unwrap();
        let vault = DeviceVault::at(dir.path().join("vault.json"));
        (dir, vault)
    }

    #[test]
    fn at_vault_cli_01_set_has_del() {
        let (_dir, vault) = temp_vault();
        let id = Some("gemini_api_key");
        assert_eq!(execute_vault_command(&vault, "has", id, None).unwrap(), "NO");
        assert_eq!(
            execute_vault_command(&vault, "set", id, Some("AIza-test")).unwrap(),
            "OK"
        );
        assert_eq!(execute_vault_command(&vault, "has", id, None).unwrap(), "YES");
        assert_eq!(execute_vault_command(&vault, "del", id, None).unwrap(), "OK");
        assert_eq!(execute_vault_command(&vault, "del", id, None).unwrap(), "ABSENT");
    }

    #[test]
    fn at_vault_cli_02_output_never_contains_secret_value() {
        let (_dir, vault) = temp_vault();
        let sentinel = "DO_NOT_LEAK_SENTINEL";
        let out =
            execute_vault_command(&vault, "set", Some("gemini_api_key"), Some(sentinel)).unwrap();
        assert!(!out.contains(sentinel));
    }

    #[test]
    fn at_vault_cli_03_unknown_ids_and_subcommands_are_rejected() {
        let (_dir, vault) = temp_vault();
        let err = execute_vault_command(&vault, "has", Some("openai_api_key"), None).unwrap_err();
        assert!(err.contains("gemini_api_key"));
        assert!(execute_vault_command(&vault, "ls", None, None).is_err());
        assert!(execute_vault_command(&vault, "has", None, None).is_err());
    }
}
