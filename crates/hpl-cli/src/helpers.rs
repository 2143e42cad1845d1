//! Input and parsing helper functions for the CLI.

use dialoguer::Password;
use hpl_core::crypto::validate_passphrase;
use hpl_core::AccountFields;
use secrecy::SecretString;

use crate::cli::AccountFieldArgs;

/// Read a non-blank environment variable.
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Prompt for the passphrase of an existing document, or read it from
/// HPL_PASSPHRASE.
pub fn prompt_passphrase(interactive: bool) -> anyhow::Result<SecretString> {
    if let Some(value) = env_value("HPL_PASSPHRASE") {
        return Ok(SecretString::from(value));
    }
    if !interactive {
        return Err(anyhow::anyhow!(
            "No passphrase provided and no TTY available. Set HPL_PASSPHRASE."
        ));
    }
    Password::new()
        .with_prompt("Passphrase")
        .interact()
        .map(SecretString::from)
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

/// Prompt for a new passphrase with confirmation, or read it from `env_var`.
///
/// The result is checked against the minimum passphrase requirements.
pub fn prompt_new_passphrase(env_var: &str, interactive: bool) -> anyhow::Result<SecretString> {
    let passphrase = match env_value(env_var) {
        Some(value) => value,
        None if !interactive => {
            return Err(anyhow::anyhow!(
                "No passphrase provided and no TTY available. Set {}.",
                env_var
            ))
        }
        None => Password::new()
            .with_prompt("Enter new passphrase")
            .with_confirmation("Confirm passphrase", "Passphrases do not match")
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))?,
    };
    let passphrase = SecretString::from(passphrase);
    validate_passphrase(&passphrase)?;
    Ok(passphrase)
}

/// Split a `key=value` argument.
pub fn parse_field(raw: &str) -> anyhow::Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid field '{}' (expected KEY=VALUE)", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow::anyhow!("Invalid field '{}': empty key", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Collect account flags into an [`AccountFields`] builder.
pub fn account_fields(args: &AccountFieldArgs) -> anyhow::Result<AccountFields> {
    let mut fields = AccountFields::new();
    if let Some(value) = &args.name {
        fields = fields.service_name(value.as_str());
    }
    if let Some(value) = &args.initial {
        fields = fields.initial(value.as_str());
    }
    if let Some(value) = &args.category {
        fields = fields.category(value.as_str());
    }
    if let Some(value) = &args.summary {
        fields = fields.summary(value.as_str());
    }
    if let Some(value) = &args.status {
        fields = fields.status(value.as_str());
    }
    for raw in &args.fields {
        let (key, value) = parse_field(raw)?;
        fields = fields.field(key, value);
    }
    Ok(fields)
}
