use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Password;

use crate::config::ConfigStore;
use crate::error::{LeonardoError, Result};
use crate::leonardo::LeonardoClient;
use crate::models::{
    FailureReason, GenerationRequest, JobStatus, ModelInfo, PricingParams, Subscription,
    UserResponse,
};
use crate::orchestrator::{self, Orchestrator};

#[derive(Debug, Parser)]
#[command(name = "leonardo", version, about = "Command-line client for the Leonardo AI image generation API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Store an API key under a named profile and make it active
    Configure {
        /// API key; prompted for interactively when omitted
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long, default_value = "default")]
        profile: String,
    },
    /// List configured profiles
    Profiles,
    /// Switch the active profile
    UseProfile { name: String },
    /// Remove a profile
    DeleteProfile { name: String },
    /// Show account information for the active profile
    User,
    /// Show API token usage
    Usage,
    /// List available models
    Models {
        /// Also list platform and user-trained models separately
        #[arg(long)]
        all: bool,
    },
    /// Estimate the cost of a generation without running it
    Estimate {
        #[arg(long, default_value_t = 512)]
        width: u32,
        #[arg(long, default_value_t = 512)]
        height: u32,
        #[arg(long, default_value_t = 1)]
        num: u32,
        #[arg(long)]
        alchemy: bool,
        #[arg(long)]
        phoenix: bool,
    },
    /// Generate images from a text prompt
    Generate {
        /// The prompt; quoting is optional, bare words are joined
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
        #[arg(long)]
        model_id: Option<String>,
        #[arg(long, default_value_t = 1)]
        num: u32,
        #[arg(long, default_value_t = 512)]
        width: u32,
        #[arg(long, default_value_t = 512)]
        height: u32,
        /// Directory for downloaded images (default: the configured output dir)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Seconds to wait for the generation before giving up
        #[arg(long, default_value_t = orchestrator::DEFAULT_MAX_WAIT_SECS)]
        timeout: u64,
        #[arg(long)]
        negative_prompt: Option<String>,
        #[arg(long)]
        guidance_scale: Option<f32>,
        /// Preset style, e.g. CINEMATIC or PHOTOGRAPHIC
        #[arg(long)]
        preset_style: Option<String>,
        /// Enable Alchemy for higher quality
        #[arg(long)]
        alchemy: bool,
        /// Enable PhotoReal mode (legacy, exclusive with --phoenix)
        #[arg(long)]
        photoreal: bool,
        #[arg(long)]
        photoreal_version: Option<String>,
        /// Use the Phoenix model
        #[arg(long)]
        phoenix: bool,
        /// Contrast for Phoenix (snapped to the vendor's valid values)
        #[arg(long)]
        contrast: Option<f32>,
    },
    /// Check the status of a generation by id
    Status { generation_id: String },
    /// Start the interactive shell
    Shell,
}

/// Map one subcommand to its client/orchestrator call and render the result.
pub async fn execute(command: Commands, store: &mut ConfigStore) -> Result<()> {
    match command {
        Commands::Configure { api_key, profile } => configure(store, api_key, profile).await,
        Commands::Profiles => {
            profiles(store);
            Ok(())
        }
        Commands::UseProfile { name } => {
            store.use_profile(&name)?;
            store.save()?;
            println!("Now using profile: {}", name.cyan());
            Ok(())
        }
        Commands::DeleteProfile { name } => delete_profile(store, &name),
        Commands::User => {
            let info = client_for(store)?.account().get_user_info().await?;
            print_user(&info);
            Ok(())
        }
        Commands::Usage => {
            let info = client_for(store)?.account().get_user_info().await?;
            match info.subscription {
                Some(subscription) => print_subscription(&subscription),
                None => println!("{}", "No subscription information available.".yellow()),
            }
            Ok(())
        }
        Commands::Models { all } => models(store, all).await,
        Commands::Estimate {
            width,
            height,
            num,
            alchemy,
            phoenix,
        } => estimate(store, width, height, num, alchemy, phoenix).await,
        Commands::Generate {
            prompt,
            model_id,
            num,
            width,
            height,
            output_dir,
            timeout,
            negative_prompt,
            guidance_scale,
            preset_style,
            alchemy,
            photoreal,
            photoreal_version,
            phoenix,
            contrast,
        } => {
            let request = GenerationRequest {
                prompt: prompt.join(" "),
                model_id,
                num_images: num,
                width,
                height,
                negative_prompt,
                guidance_scale,
                preset_style,
                alchemy,
                photoreal,
                photoreal_version,
                phoenix,
                contrast,
            };
            generate(store, request, output_dir, timeout).await
        }
        Commands::Status { generation_id } => status(store, &generation_id).await,
        // Routed to shell::run by main; the shell itself refuses to nest.
        Commands::Shell => Ok(()),
    }
}

fn client_for(store: &ConfigStore) -> Result<LeonardoClient> {
    let api_key = store.api_key(None).ok_or_else(|| {
        LeonardoError::Config(
            "no API key configured; run 'leonardo configure' or set LEONARDO_API_KEY".into(),
        )
    })?;
    LeonardoClient::new(&api_key)
}

async fn configure(store: &mut ConfigStore, api_key: Option<String>, profile: String) -> Result<()> {
    let api_key = match api_key {
        Some(key) => key,
        None => Password::new()
            .with_prompt("Enter your Leonardo AI API key")
            .interact()?,
    };
    if api_key.trim().is_empty() {
        return Err(LeonardoError::validation("api-key", "must not be empty"));
    }

    store.set_profile(profile.as_str(), api_key.trim());
    store.save()?;
    println!("Configuration saved under profile '{}'.", profile.cyan());

    // Best effort verification; a failure here is worth a warning, not a
    // failed command, since the key is already stored.
    match client_for(store)?.account().get_user_info().await {
        Ok(info) => {
            let username = info
                .user
                .and_then(|u| u.username)
                .unwrap_or_else(|| "unknown".to_string());
            println!("{} Logged in as: {}", "API key verified.".green(), username);
        }
        Err(e) => log::warn!("Could not verify API key: {}", e),
    }
    Ok(())
}

fn profiles(store: &ConfigStore) {
    if !store.has_profiles() {
        println!(
            "{}",
            "No profiles configured. Run 'leonardo configure' to create one.".yellow()
        );
        return;
    }

    let active = store.active_profile().to_string();
    println!("{:<16} {:<24} {}", "PROFILE".cyan().bold(), "API KEY".cyan().bold(), "ACTIVE".cyan().bold());
    for (name, record) in store.profiles() {
        let marker = if *name == active { "*" } else { "" };
        println!("{:<16} {:<24} {}", name, mask_key(&record.api_key), marker);
    }
}

fn delete_profile(store: &mut ConfigStore, name: &str) -> Result<()> {
    store.delete_profile(name)?;
    store.save()?;
    println!("Profile '{}' deleted.", name.cyan());
    if store.has_profiles() {
        println!("Active profile is now: {}", store.active_profile().cyan());
    }
    Ok(())
}

async fn models(store: &ConfigStore, all: bool) -> Result<()> {
    let client = client_for(store)?;

    if all {
        // Per-endpoint failures only cost us that section of the listing.
        let platform = client.models().list_platform_models().await.unwrap_or_else(|e| {
            log::warn!("Could not fetch platform models: {}", e);
            Vec::new()
        });
        let custom = client.models().list_custom_models().await.unwrap_or_else(|e| {
            log::warn!("Could not fetch custom models: {}", e);
            Vec::new()
        });

        if !platform.is_empty() {
            print_models("Platform models", &platform);
        }
        if !custom.is_empty() {
            print_models("Custom models", &custom);
        }
        if platform.is_empty() && custom.is_empty() {
            println!("{}", "No models found.".yellow());
        }
    } else {
        let models = client.models().list_models().await;
        if models.is_empty() {
            println!("{}", "No models found.".yellow());
        } else {
            print_models("Available models", &models);
        }
    }
    Ok(())
}

async fn estimate(
    store: &ConfigStore,
    width: u32,
    height: u32,
    num: u32,
    alchemy: bool,
    phoenix: bool,
) -> Result<()> {
    let client = client_for(store)?;
    let params = PricingParams::image_generation(width, height, num, alchemy, phoenix);
    let pricing = client.account().calculate_pricing(params).await?;
    let cost = pricing.cost.unwrap_or(0.0);

    println!("{}", "Cost estimate".cyan().bold());
    println!("  Size:    {}x{}", width, height);
    println!("  Images:  {}", num);
    println!("  Alchemy: {}", if alchemy { "yes" } else { "no" });
    println!("  Phoenix: {}", if phoenix { "yes" } else { "no" });
    println!("  {} {} credits", "Estimated cost:".green(), cost);
    Ok(())
}

async fn generate(
    store: &ConfigStore,
    mut request: GenerationRequest,
    output_dir: Option<PathBuf>,
    timeout: u64,
) -> Result<()> {
    let client = client_for(store)?;

    // Pick a default model when none is implied by the mode flags: the
    // configured default first, otherwise the first model the API lists.
    if request.model_id.is_none() && !request.phoenix && !request.photoreal {
        if let Some(model) = store.default_model() {
            request.model_id = Some(model.to_string());
        } else {
            let models = client.models().list_models().await;
            let first = models.into_iter().find(|m| m.id.is_some()).ok_or_else(|| {
                LeonardoError::Remote("no models available to pick a default from".into())
            })?;
            log::info!(
                "Using model: {} ({})",
                first.name.as_deref().unwrap_or("unnamed"),
                first.id.as_deref().unwrap_or("")
            );
            request.model_id = first.id;
        }
    }

    print_request(&request);

    let output_dir = output_dir.unwrap_or_else(|| store.output_dir());
    let orchestrator = Orchestrator::new(client, output_dir).with_max_wait(timeout);

    let job_id = orchestrator.submit(&request).await?;
    let job = orchestrator.poll(&job_id).await?;

    match job.status {
        JobStatus::Complete => {
            println!(
                "{} {} image(s) generated.",
                "Generation complete:".green(),
                job.result_urls.len()
            );
            let report = orchestrator.download(&job).await?;
            println!("{}", report.summary());
            for path in &report.saved {
                println!("  {}", path.display());
            }
            Ok(())
        }
        _ => Err(job_error(job)),
    }
}

/// Turn a job that did not complete into the error the command exits with.
fn job_error(job: crate::models::GenerationJob) -> LeonardoError {
    match job.failure {
        Some(FailureReason::TimedOut { seconds }) => LeonardoError::Timeout { seconds },
        Some(FailureReason::Server(msg)) => {
            LeonardoError::Remote(format!("generation failed: {}", msg))
        }
        None if job.status == JobStatus::Pending => {
            LeonardoError::Remote("generation still pending".into())
        }
        None => LeonardoError::Remote("generation failed".into()),
    }
}

async fn status(store: &ConfigStore, generation_id: &str) -> Result<()> {
    let client = client_for(store)?;
    let details = client.generation().get_generation(generation_id).await?;
    let job = orchestrator::job_from_details(generation_id, &details);

    println!("Status: {}", job.status.to_string().bold());
    match job.status {
        JobStatus::Complete => {
            println!("Generated {} image(s):", job.result_urls.len());
            for url in &job.result_urls {
                println!("  {}", url);
            }
        }
        JobStatus::Failed => {
            if let Some(reason) = &job.failure {
                println!("{} {}", "Reason:".red(), reason);
            }
        }
        JobStatus::Pending => {}
    }
    Ok(())
}

fn print_models(title: &str, models: &[ModelInfo]) {
    println!("{}", title.cyan().bold());
    for model in models {
        println!(
            "  {:<38} {:<28} {}",
            model.id.as_deref().unwrap_or("-"),
            model.name.as_deref().unwrap_or("-"),
            model
                .description
                .as_deref()
                .or(model.status.as_deref())
                .unwrap_or("")
        );
    }
}

fn print_user(info: &UserResponse) {
    println!("{}", "User information".cyan().bold());
    if let Some(user) = &info.user {
        println!("  User ID:  {}", user.id.as_deref().unwrap_or("N/A"));
        println!("  Username: {}", user.username.as_deref().unwrap_or("N/A"));
        println!("  Email:    {}", user.email.as_deref().unwrap_or("N/A"));
    }
    if let Some(subscription) = &info.subscription {
        print_subscription(subscription);
    }
}

fn print_subscription(subscription: &Subscription) {
    println!("{}", "Subscription".cyan().bold());
    println!("  Plan:             {}", subscription.plan.as_deref().unwrap_or("N/A"));
    println!("  Tokens remaining: {}", format_count(subscription.tokens_remaining));
    println!("  Tokens used:      {}", format_count(subscription.tokens_used));
    println!("  Total tokens:     {}", format_count(subscription.total_tokens));
    println!(
        "  Next renewal:     {}",
        subscription.next_renewal_date.as_deref().unwrap_or("N/A")
    );
    if let Some(bar) = usage_bar(subscription.tokens_used, subscription.total_tokens) {
        println!("  {}", bar);
    }
}

fn format_count(value: Option<i64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn usage_bar(used: Option<i64>, total: Option<i64>) -> Option<String> {
    let (used, total) = (used?, total?);
    if total <= 0 || used < 0 {
        return None;
    }
    const WIDTH: usize = 50;
    let ratio = (used as f64 / total as f64).min(1.0);
    let filled = (ratio * WIDTH as f64) as usize;
    Some(format!(
        "[{}{}] {:.1}%",
        "#".repeat(filled),
        " ".repeat(WIDTH - filled),
        ratio * 100.0
    ))
}

fn print_request(request: &GenerationRequest) {
    println!("{}", "Generation settings".cyan().bold());
    println!("  Prompt:  {}", request.prompt);
    if request.phoenix {
        match request.contrast {
            Some(contrast) => println!("  Model:   Leonardo Phoenix (contrast {})", contrast),
            None => println!("  Model:   Leonardo Phoenix (default contrast)"),
        }
    } else {
        println!(
            "  Model:   {}",
            request.model_id.as_deref().unwrap_or(if request.photoreal {
                "none (PhotoReal)"
            } else {
                "none"
            })
        );
    }
    println!("  Size:    {}x{}", request.width, request.height);
    println!("  Count:   {}", request.num_images);
    println!("  Alchemy: {}", if request.alchemy { "enabled" } else { "disabled" });
    if !request.phoenix {
        println!(
            "  PhotoReal: {}",
            if request.photoreal { "enabled" } else { "disabled" }
        );
    }
    if let Some(negative) = &request.negative_prompt {
        println!("  Negative prompt: {}", negative);
    }
    if let Some(scale) = request.guidance_scale {
        println!("  Guidance scale:  {}", scale);
    }
    if let Some(style) = &request.preset_style {
        println!("  Preset style:    {}", style);
    }
}

fn mask_key(key: &str) -> String {
    // Keys are not guaranteed ASCII; count and slice by chars so a
    // multibyte character at the boundary cannot panic.
    let count = key.chars().count();
    if count > 16 {
        let head: String = key.chars().take(8).collect();
        let tail: String = key.chars().skip(count - 8).collect();
        format!("{}...{}", head, tail)
    } else {
        "********".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn masks_short_keys_entirely() {
        assert_eq!(mask_key("shortkey"), "********");
        assert_eq!(mask_key("0123456789abcdef0123"), "01234567...cdef0123");
    }

    #[test]
    fn masks_multibyte_keys_without_panicking() {
        assert_eq!(mask_key("aaaaaaaé-rest-of-key-padding"), "aaaaaaaé...-padding");
        assert_eq!(mask_key("ééééééééééééééééééé"), "éééééééé...éééééééé");
        assert_eq!(mask_key("éééé"), "********");
    }

    #[test]
    fn non_complete_jobs_map_to_errors_not_panics() {
        use crate::models::{FailureReason, GenerationJob};

        let timed_out = GenerationJob::failed("g", FailureReason::TimedOut { seconds: 120 });
        assert!(matches!(job_error(timed_out), LeonardoError::Timeout { seconds: 120 }));

        let server = GenerationJob::failed("g", FailureReason::Server("bad prompt".into()));
        match job_error(server) {
            LeonardoError::Remote(msg) => assert!(msg.contains("bad prompt")),
            other => panic!("unexpected error: {:?}", other),
        }

        let pending = GenerationJob::pending("g");
        match job_error(pending) {
            LeonardoError::Remote(msg) => assert!(msg.contains("still pending")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn usage_bar_handles_edge_values() {
        assert!(usage_bar(Some(50), Some(100)).unwrap().contains("50.0%"));
        assert!(usage_bar(Some(0), Some(100)).unwrap().contains("0.0%"));
        assert_eq!(usage_bar(Some(10), Some(0)), None);
        assert_eq!(usage_bar(None, Some(100)), None);
    }

    #[test]
    fn bare_prompt_words_are_joined() {
        let cli = Cli::try_parse_from(["leonardo", "generate", "a", "sunset", "--alchemy"]).unwrap();
        match cli.command {
            Commands::Generate { prompt, alchemy, .. } => {
                assert_eq!(prompt.join(" "), "a sunset");
                assert!(alchemy);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn unknown_subcommand_is_a_parse_error() {
        assert!(Cli::try_parse_from(["leonardo", "frobnicate"]).is_err());
    }

    #[test]
    fn shell_tokens_parse_like_cli_arguments() {
        let tokens = crate::shell::tokenize(r#"generate "a sunset over mountains" --phoenix"#).unwrap();
        let argv = std::iter::once("leonardo".to_string()).chain(tokens);
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Generate { prompt, phoenix, .. } => {
                assert_eq!(prompt, vec!["a sunset over mountains"]);
                assert!(phoenix);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
