use crate::bootstrap::build_dashboard;
use serde_json::json;
use std::time::Duration;
use tickerdash_application::config::Config;
use tickerdash_domain::services::symbols::ResolutionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessMode {
    Resolve,
    Quote,
    Watch,
}

pub struct HeadlessArgs {
    pub mode: HeadlessMode,
    pub symbols: Vec<String>,
    pub rounds: usize,
    pub export: bool,
    pub no_persist: bool,
}

pub fn run_headless(config: &Config, args: HeadlessArgs) -> Result<serde_json::Value, String> {
    if args.symbols.iter().all(|s| s.trim().is_empty()) {
        return Err("--symbols is required in headless mode".to_string());
    }
    match args.mode {
        HeadlessMode::Resolve => Ok(run_resolve(config, &args.symbols)),
        HeadlessMode::Quote | HeadlessMode::Watch => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| format!("failed to init tokio runtime: {err}"))?;
            runtime.block_on(async {
                match args.mode {
                    HeadlessMode::Quote => run_quote(config, &args).await,
                    _ => run_watch(config, &args).await,
                }
            })
        }
    }
}

fn run_resolve(config: &Config, symbols: &[String]) -> serde_json::Value {
    let resolver = config.resolver();
    let rows: Vec<serde_json::Value> = symbols
        .iter()
        .map(|input| {
            let res = resolver.resolve_detailed(input);
            let (kind, alias, distance) = match &res.kind {
                ResolutionKind::Exact => ("exact", None, 0),
                ResolutionKind::Fuzzy { alias, distance } => ("fuzzy", Some(alias.clone()), *distance),
                ResolutionKind::Literal => ("literal", None, 0),
            };
            json!({
                "input": input,
                "symbol": res.symbol,
                "match": kind,
                "alias": alias,
                "distance": distance,
            })
        })
        .collect();
    json!({ "status": "ok", "mode": "resolve", "results": rows })
}

async fn run_quote(config: &Config, args: &HeadlessArgs) -> Result<serde_json::Value, String> {
    let parts = build_dashboard(config, args.no_persist)?;
    let mut replies = Vec::new();
    for input in &args.symbols {
        if let Some(reply) = parts.controller.chat_lookup(input).await {
            replies.push(reply);
        }
    }
    Ok(json!({ "status": "ok", "mode": "quote", "replies": replies }))
}

async fn run_watch(config: &Config, args: &HeadlessArgs) -> Result<serde_json::Value, String> {
    let parts = build_dashboard(config, args.no_persist)?;
    let mut controller = parts.controller;

    let mut added = Vec::new();
    let mut rejected = Vec::new();
    for input in &args.symbols {
        match controller.add_ticker(input).await {
            Ok(outcome) => added.push(outcome),
            Err(err) => {
                tracing::warn!(input = %input, error = %err, "ticker not added");
                rejected.push(json!({ "input": input, "error": err.to_string() }));
            }
        }
    }

    let mut rounds = Vec::new();
    if !added.is_empty() {
        for _ in 0..clamp_rounds(args.rounds, parts.refresh_every) {
            tokio::time::sleep(parts.refresh_every).await;
            rounds.push(controller.refresh_all().await);
        }
    }

    let exported = if args.export {
        let out = controller.export_to(&parts.exporter)?;
        Some(out.path.display().to_string())
    } else {
        None
    };

    Ok(json!({
        "status": "ok",
        "mode": "watch",
        "added": added,
        "rejected": rejected,
        "rounds": rounds,
        "snapshot": controller.export_snapshot(),
        "exported": exported,
    }))
}

/// Caps `--rounds` at one hour of polling.
pub fn clamp_rounds(rounds: usize, interval: Duration) -> usize {
    let max_rounds = (Duration::from_secs(3600).as_millis() / interval.as_millis().max(1)) as usize;
    rounds.min(max_rounds.max(1))
}

#[cfg(test)]
mod tests {
    use super::{clamp_rounds, run_headless, HeadlessArgs, HeadlessMode};
    use std::time::Duration;
    use tickerdash_application::config::{AliasConfig, Config};

    fn args(mode: HeadlessMode, symbols: &[&str]) -> HeadlessArgs {
        HeadlessArgs {
            mode,
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            rounds: 0,
            export: false,
            no_persist: true,
        }
    }

    #[test]
    fn resolve_reports_match_kind_without_network() {
        let mut config = Config::default();
        config.aliases.push(AliasConfig {
            alias: "berkshire".to_string(),
            symbol: "BRK.B".to_string(),
        });
        let out = run_headless(
            &config,
            args(HeadlessMode::Resolve, &["appl", "aple", "xyz123", "berkshire"]),
        )
        .expect("resolve");
        let results = out["results"].as_array().expect("results");
        assert_eq!(results[0]["symbol"], "AAPL");
        assert_eq!(results[0]["match"], "exact");
        assert_eq!(results[1]["match"], "fuzzy");
        assert_eq!(results[1]["alias"], "apple");
        assert_eq!(results[1]["distance"], 1);
        assert_eq!(results[2]["symbol"], "XYZ123");
        assert_eq!(results[2]["match"], "literal");
        assert_eq!(results[3]["symbol"], "BRK.B");
    }

    #[test]
    fn symbols_are_required() {
        let err = run_headless(&Config::default(), args(HeadlessMode::Watch, &[" "]))
            .expect_err("no symbols");
        assert!(err.contains("--symbols"));
    }

    #[test]
    fn rounds_are_capped_at_an_hour() {
        assert_eq!(clamp_rounds(3, Duration::from_secs(5)), 3);
        assert_eq!(clamp_rounds(10_000, Duration::from_secs(5)), 720);
        assert_eq!(clamp_rounds(10, Duration::from_secs(7200)), 1);
    }
}
