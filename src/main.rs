use clap::{Arg, Command};
use lexitier::mt::{
    GoogleTranslateProvider, MachineTranslator, MockMode, MockTranslator, RestContributionStore,
    TranslatorGateway,
};
use lexitier::{OverlayCache, ResolutionResult, Resolver, ResolverConfig, load_dictionary_from_file};
use std::env;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("lexitier")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve a phrase against the dictionary, the contribution overlay and a translation gateway")
        .arg(
            Arg::new("text")
                .help("Source text to resolve")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("dict")
                .long("dict")
                .short('d')
                .help("Dictionary JSON file")
                .default_value("data/vi-tyz.json"),
        )
        .arg(
            Arg::new("source-locale")
                .long("source")
                .short('s')
                .help("Source language code (default: LEXITIER_SOURCE_LOCALE or vi)"),
        )
        .arg(
            Arg::new("target-locale")
                .long("target")
                .short('t')
                .help("Target language code (default: LEXITIER_TARGET_LOCALE or tyz)"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use mock translator instead of Google Translate")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("offline")
                .long("offline")
                .help("Skip the overlay and the translation gateway")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the resolution as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log tier decisions to stderr")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if verbose { "lexitier=debug" } else { "warn" })
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let text = matches
        .get_one::<String>("text")
        .ok_or("missing text argument")?;
    let dict_path = matches
        .get_one::<String>("dict")
        .ok_or("missing dictionary path")?;
    let offline = matches.get_flag("offline");

    let mut config = ResolverConfig::from_env()?;
    if let Some(locale) = matches.get_one::<String>("source-locale") {
        config.source_locale = locale.clone();
    }
    if let Some(locale) = matches.get_one::<String>("target-locale") {
        config.target_locale = locale.clone();
    }
    config.validate()?;

    let dictionary = load_dictionary_from_file(Path::new(dict_path))?;
    let mut resolver = Resolver::new(Arc::new(dictionary)).with_config(&config);

    if !offline {
        let store = match env::var("LEXITIER_STORE_URL") {
            Ok(_) => Some(Arc::new(RestContributionStore::from_env()?)),
            Err(_) => None,
        };
        if let Some(store) = &store {
            resolver = resolver.with_overlay(Arc::new(OverlayCache::from_config(
                store.clone(),
                &config,
            )));
        }

        let translator: Arc<dyn MachineTranslator> = if matches.get_flag("mock") {
            Arc::new(MockTranslator::new(MockMode::Suffix))
        } else {
            if env::var("GOOGLE_TRANSLATE_API_KEY").is_err() {
                eprintln!("❌ GOOGLE_TRANSLATE_API_KEY environment variable not set");
                eprintln!("   Set it with: export GOOGLE_TRANSLATE_API_KEY=your_api_key");
                eprintln!("   Or use --mock or --offline");
                return Err("Missing API key".into());
            }
            Arc::new(GoogleTranslateProvider::from_env()?)
        };

        let mut gateway =
            TranslatorGateway::new(translator, &config.source_locale, &config.target_locale)?;
        if let Some(store) = store {
            gateway = gateway.with_store(store);
        }
        resolver = resolver.with_gateway(Arc::new(gateway));
    }

    let result = resolver.resolve(text).await;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(())
}

fn print_result(result: &ResolutionResult) {
    for found in &result.direct_matches {
        println!(
            "✅ {} → {}",
            found.word,
            found.entry.script_variants.join(" / ")
        );
    }
    for inferred in &result.inferred_matches {
        println!(
            "🔍 {} → {} ({} confidence)",
            inferred.word, inferred.script, inferred.confidence
        );
        println!("   {}", inferred.reasoning);
    }
    for token in &result.unresolved {
        println!("❓ {}", token);
    }
}
