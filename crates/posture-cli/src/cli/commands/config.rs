//! `posturescan config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::OutputFormat;

pub async fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Set { key, value } => set_config(&ctx, &key, &value),
        ConfigCommands::Init { force } => init_config(&ctx, force),
        ConfigCommands::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    match ctx.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(config)?),
        OutputFormat::Csv | OutputFormat::Pretty => {
            println!("{}", "Current Configuration:".bold());
            println!("  {} {}", "file:".bold(), ctx.config_path.display());
            println!();
            println!("  {} {}", "results_dir:".bold(), config.results_dir().display());
            println!(
                "  {} {}",
                "output_format:".bold(),
                config.output_format.unwrap_or_default()
            );
            println!();
            println!("{}", "[probe]".bold());
            let probe = &config.probe;
            println!("  ping_timeout_ms     {}", probe.ping_timeout_ms);
            println!("  session_timeout_ms  {}", probe.session_timeout_ms);
            println!("  share_timeout_ms    {}", probe.share_timeout_ms);
            println!("  rpc_timeout_ms      {}", probe.rpc_timeout_ms);
            println!("  concurrency         {}", probe.concurrency);
            println!("  admin_share         {}", probe.admin_share);
            println!(
                "  ports               {}/{}/{}",
                probe.remote_management_port, probe.file_share_port, probe.rpc_port
            );
            println!();
            println!("{}", "[privesc]".bold());
            let privesc = &config.privesc;
            println!("  broad_principals    {}", privesc.broad_principals.join(", "));
            println!("  command_timeout_ms  {}", privesc.command_timeout_ms);
            println!("  acl_concurrency     {}", privesc.acl_concurrency);
        }
    }

    Ok(())
}

/// Apply one `key = value` update to a config.
pub fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "results_dir" => config.results_dir = Some(value.into()),
        "output_format" | "output" => config.output_format = Some(value.parse()?),
        "probe.ping_timeout_ms" => config.probe.ping_timeout_ms = value.parse()?,
        "probe.session_timeout_ms" => config.probe.session_timeout_ms = value.parse()?,
        "probe.share_timeout_ms" => config.probe.share_timeout_ms = value.parse()?,
        "probe.rpc_timeout_ms" => config.probe.rpc_timeout_ms = value.parse()?,
        "probe.concurrency" => config.probe.concurrency = value.parse()?,
        "probe.admin_share" => config.probe.admin_share = value.to_string(),
        "privesc.broad_principals" => {
            config.privesc.broad_principals = value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
        "privesc.command_timeout_ms" => config.privesc.command_timeout_ms = value.parse()?,
        "privesc.acl_concurrency" => config.privesc.acl_concurrency = value.parse()?,
        _ => {
            anyhow::bail!(
                "Unknown config key: {}\n\n\
                 Available keys:\n  \
                 results_dir               - Base directory for reports\n  \
                 output_format             - Default output format (pretty/json/csv/yaml)\n  \
                 probe.<timeout>_ms        - ping, session, share or rpc timeout\n  \
                 probe.concurrency         - Hosts probed at the same time\n  \
                 probe.admin_share         - Administrative share name\n  \
                 privesc.broad_principals  - Comma-separated identities\n  \
                 privesc.command_timeout_ms\n  \
                 privesc.acl_concurrency",
                key
            );
        }
    }
    Ok(())
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = ctx.config.clone();
    apply(&mut config, key, value)?;
    config.save_to(&ctx.config_path)?;
    println!("{} {} set to {}.", "Success:".green().bold(), key, value.cyan());
    Ok(())
}

fn init_config(ctx: &Context, force: bool) -> Result<()> {
    if ctx.config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            ctx.config_path.display()
        );
    }
    Config::default().save_to(&ctx.config_path)?;
    println!(
        "{} wrote defaults to {}",
        "Success:".green().bold(),
        ctx.config_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_known_keys() {
        let mut config = Config::default();
        apply(&mut config, "probe.concurrency", "4").unwrap();
        apply(&mut config, "output_format", "csv").unwrap();
        apply(&mut config, "privesc.broad_principals", "Everyone, Guests").unwrap();

        assert_eq!(config.probe.concurrency, 4);
        assert_eq!(config.output_format, Some(OutputFormat::Csv));
        assert_eq!(config.privesc.broad_principals, vec!["Everyone", "Guests"]);
    }

    #[test]
    fn apply_rejects_bad_input() {
        let mut config = Config::default();
        assert!(apply(&mut config, "api_key", "x").is_err());
        assert!(apply(&mut config, "probe.concurrency", "many").is_err());
    }
}
