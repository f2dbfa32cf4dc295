use {anyhow::Result, clap::Subcommand, streamify_config::StreamifyConfig};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration and print the resolved settings.
    Check,
}

pub fn handle_config(action: ConfigAction, config: &StreamifyConfig) -> Result<()> {
    match action {
        ConfigAction::Check => check(config),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(config: &StreamifyConfig) -> Result<()> {
    for line in summary(config) {
        eprintln!("{line}");
    }
    eprintln!();

    match streamify_config::validate(config) {
        Ok(credentials) => {
            eprintln!(
                "{GREEN}{BOLD}ok{RESET}: credentials present (api_id {})",
                credentials.api_id
            );
            Ok(())
        },
        Err(e) => {
            eprintln!("{RED}{BOLD}error{RESET}: {e}");
            Err(e.into())
        },
    }
}

/// Human-readable resolved settings. Secrets are reported as set or unset only.
fn summary(config: &StreamifyConfig) -> Vec<String> {
    let set_or_unset = |present: bool| if present { "set" } else { "unset" };
    let creds = &config.telegram;
    vec![
        format!("api_id:         {}", creds.api_id.as_deref().unwrap_or("unset")),
        format!("api_hash:       {}", set_or_unset(creds.api_hash.is_some())),
        format!("bot_token:      {}", set_or_unset(creds.bot_token.is_some())),
        format!(
            "api_url:        {}",
            creds.api_url.as_deref().unwrap_or("https://api.telegram.org")
        ),
        format!(
            "staging dir:    {}",
            config.staging.resolved_dir().display()
        ),
        format!("max file bytes: {}", config.max_file_bytes()),
        format!(
            "caption:        {}",
            config.relay.caption.as_deref().unwrap_or("none")
        ),
    ]
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::Secret};

    #[test]
    fn summary_never_prints_secrets() {
        let mut config = StreamifyConfig::default();
        config.telegram.api_id = Some("12345".into());
        config.telegram.api_hash = Some(Secret::new("very-secret-hash".into()));
        config.telegram.bot_token = Some(Secret::new("123:ABC".into()));

        let text = summary(&config).join("\n");
        assert!(text.contains("12345"));
        assert!(text.contains("bot_token:      set"));
        assert!(!text.contains("very-secret-hash"));
        assert!(!text.contains("123:ABC"));
    }

    #[test]
    fn check_fails_without_credentials() {
        assert!(check(&StreamifyConfig::default()).is_err());
    }
}
