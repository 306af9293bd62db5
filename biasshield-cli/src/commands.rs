//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use crate::ReportKind;
use crate::render;
use biasshield_core::calendar::today;
use biasshield_core::config::write_default_config;
use biasshield_core::remediation::{RemediationSession, RemediationStrategy};
use biasshield_core::trend::{MetricField, TimeRange, summarize_series};
use biasshield_core::{
    AttributePair, Dashboard, DashboardConfig, LoanApplication, ProtectedAttribute,
    filter_by_time_range, get_remediation_suggestions, load_config,
};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Flags shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub workspace: PathBuf,
    pub json: bool,
    pub quiet: bool,
    pub backend_url: Option<String>,
    pub offline: bool,
}

impl GlobalOptions {
    fn config(&self) -> anyhow::Result<DashboardConfig> {
        let mut config = load_config(Some(&self.workspace), None)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        if let Some(url) = &self.backend_url {
            config.backend.base_url = url.clone();
        }
        if self.offline {
            config.backend.enabled = false;
        }
        Ok(config)
    }

    fn dashboard(&self) -> anyhow::Result<Dashboard> {
        Ok(Dashboard::from_config(self.config()?)?)
    }
}

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands, options: &GlobalOptions) -> anyhow::Result<()> {
    match command {
        Commands::Predict {
            file,
            gender,
            race,
            age,
            income,
            credit_score,
            loan_amount,
            explain,
            pdf,
        } => {
            let mut application = match file {
                Some(path) => read_application(&path)?,
                None => LoanApplication::default(),
            };
            if let Some(v) = gender {
                application.gender = v;
            }
            if let Some(v) = race {
                application.race = v;
            }
            if let Some(v) = age {
                application.age = v;
            }
            if let Some(v) = income {
                application.income = v;
            }
            if let Some(v) = credit_score {
                application.credit_score = v;
            }
            if let Some(v) = loan_amount {
                application.loan_amount = v;
            }
            handle_predict(&application, explain, pdf.as_deref(), options).await
        }
        Commands::Fairness => handle_fairness(options).await,
        Commands::Intersectional {
            primary,
            secondary,
            flagged,
        } => handle_intersectional(primary, secondary, flagged, options),
        Commands::Trends {
            attribute,
            range,
            metric,
            window,
        } => handle_trends(attribute, range, metric, window, options),
        Commands::Remediate {
            attribute,
            strategy,
            strength,
        } => handle_remediate(attribute, strategy, strength, options).await,
        Commands::Report { kind } => handle_report(kind, options).await,
        Commands::Analyze => handle_analyze(options).await,
        Commands::Config { action } => handle_config(action, options),
    }
}

fn read_application(path: &Path) -> anyhow::Result<LoanApplication> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let application = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid application in {}: {}", path.display(), e))?;
    Ok(application)
}

async fn handle_predict(
    application: &LoanApplication,
    explain: bool,
    pdf: Option<&Path>,
    options: &GlobalOptions,
) -> anyhow::Result<()> {
    let dashboard = options.dashboard()?;
    let prediction = dashboard.predict(application).await;
    render::source_notice(prediction.source, options.quiet);

    let letter = if explain || pdf.is_some() {
        let letter = dashboard.explain_loan(application, &prediction.value).await;
        render::source_notice(letter.source, options.quiet);
        Some(letter.value)
    } else {
        None
    };

    if let Some(path) = pdf {
        let text = letter.as_deref().unwrap_or_default();
        match dashboard
            .loan_decision_pdf(application, &prediction.value, text)
            .await
        {
            Some(bytes) => {
                std::fs::write(path, bytes)?;
                if !options.quiet {
                    eprintln!("Saved decision letter to {}", path.display());
                }
            }
            None => eprintln!("PDF generation requires the backend; no file written."),
        }
    }

    if options.json {
        return render::print_json(&json!({
            "application": application,
            "prediction": prediction.value,
            "source": prediction.source,
            "letter": letter,
        }));
    }

    let p = &prediction.value;
    println!(
        "Decision: {} ({} approval probability)",
        if p.approved { "APPROVED" } else { "DECLINED" },
        render::percent(p.approval_probability)
    );
    println!("Applicant age group: {}", application.age_group());
    println!("\nTop factors:");
    for (factor, weight) in p.top_factors(5) {
        println!("  {:<14} {:>6}  {}", factor, render::percent(weight), render::bar(weight));
    }
    if explain {
        if let Some(letter) = &letter {
            println!("\n{}", letter);
        }
    }
    Ok(())
}

async fn handle_fairness(options: &GlobalOptions) -> anyhow::Result<()> {
    let dashboard = options.dashboard()?;
    let report = dashboard.fairness().await;
    render::source_notice(report.source, options.quiet);

    if options.json {
        return render::print_json(&report);
    }

    for (attribute, metrics) in report.value.attributes() {
        println!("{}", attribute.label());
        print!("{}", render::metrics_table(metrics));
        let disparity = metrics.to_summary(attribute).disparity();
        for suggestion in get_remediation_suggestions(&disparity) {
            println!("  - {}", suggestion);
        }
        println!();
    }
    let (worst, disparity) = report.value.most_biased();
    println!(
        "Largest approval disparity: {} ({})",
        worst.label(),
        render::percent(disparity)
    );
    Ok(())
}

fn handle_intersectional(
    primary: ProtectedAttribute,
    secondary: ProtectedAttribute,
    flagged: bool,
    options: &GlobalOptions,
) -> anyhow::Result<()> {
    let dashboard = options.dashboard()?;
    let data = dashboard.intersectional();

    let Some(records) = data.get(primary, secondary) else {
        if options.json {
            return render::print_json(&json!({ "pair": [primary, secondary], "records": null }));
        }
        println!(
            "No data available for {} x {}.",
            primary.label(),
            secondary.label()
        );
        return Ok(());
    };

    let records: Vec<_> = if flagged {
        biasshield_core::aggregate::flag_adverse_impact(records)
            .into_iter()
            .cloned()
            .collect()
    } else {
        records.to_vec()
    };

    if options.json {
        let key = AttributePair::new(primary, secondary).map(|p| p.key());
        return render::print_json(&json!({ "pair": key, "records": records }));
    }

    println!("{} x {}", primary.label(), secondary.label());
    if records.is_empty() {
        println!("  No combinations below the four-fifths threshold.");
        return Ok(());
    }
    print!("{}", render::intersectional_table(&records));
    if let Some(worst) = data.most_disadvantaged(primary, secondary) {
        println!(
            "\nMost disadvantaged: {} (disparate impact {:.2})",
            worst.label(),
            worst.disparate_impact
        );
    }
    Ok(())
}

fn handle_trends(
    attribute: ProtectedAttribute,
    range: Option<TimeRange>,
    metric: MetricField,
    window: Option<usize>,
    options: &GlobalOptions,
) -> anyhow::Result<()> {
    let dashboard = options.dashboard()?;
    let range = range.unwrap_or(dashboard.config().trend.default_range);
    let window = window.unwrap_or(dashboard.config().trend.moving_average_window);

    let now = today();
    let data = dashboard.temporal(now);
    let Some(series) = data.get(&attribute) else {
        println!("No data available for {}.", attribute.label());
        return Ok(());
    };
    let series = filter_by_time_range(series, range, now);
    let summary = summarize_series(&series, metric, window);

    if options.json {
        return render::print_json(&json!({
            "attribute": attribute,
            "range": range,
            "series": series,
            "summary": summary,
        }));
    }

    println!(
        "{}: {} over {} (window {})",
        attribute.label(),
        metric.as_str(),
        range,
        window
    );
    print!("{}", render::series_table(&series, &summary));

    if summary.trend.sufficient_data {
        println!(
            "\nTrend: {} ({:+.1}%)",
            summary.trend.trend, summary.trend.percent_change
        );
    } else {
        println!("\nTrend: not enough data");
    }
    match (summary.volatility, summary.volatility_level) {
        (Some(v), Some(level)) => println!("Volatility: {} ({:.3})", level, v),
        _ => println!("Volatility: N/A"),
    }
    Ok(())
}

async fn handle_remediate(
    attribute: ProtectedAttribute,
    strategy: RemediationStrategy,
    strength: f64,
    options: &GlobalOptions,
) -> anyhow::Result<()> {
    let dashboard = options.dashboard()?;
    let report = dashboard.fairness().await;
    render::source_notice(report.source, options.quiet);

    let Some(metrics) = report.value.get(attribute) else {
        println!("No data available for {}.", attribute.label());
        return Ok(());
    };

    let mut session =
        RemediationSession::new(metrics.to_summary(attribute).approval_rates());
    let result = session.apply(strategy, strength);

    if options.json {
        return render::print_json(&json!({
            "attribute": attribute,
            "groups": session.groups(),
            "result": result,
        }));
    }

    println!("{} - {}", attribute.label(), strategy.description());
    println!("  {:<12} {:>9} {:>9}", "Group", "Before", "After");
    for ((group, before), after) in session
        .groups()
        .iter()
        .zip(session.baseline())
        .zip(session.current_values())
    {
        println!(
            "  {:<12} {:>9} {:>9}  {}",
            group,
            render::percent(*before),
            render::percent(*after),
            render::bar(*after)
        );
    }
    println!(
        "\nDisparity reduced by {:.1}% at strength {:.2}",
        result.improvement_percent, result.strength
    );
    Ok(())
}

async fn handle_report(kind: ReportKind, options: &GlobalOptions) -> anyhow::Result<()> {
    let dashboard = options.dashboard()?;
    let report = dashboard.fairness().await;
    render::source_notice(report.source, options.quiet);

    let text = match kind {
        ReportKind::Bias => dashboard.explain_bias(&report.value).await,
        ReportKind::Remediation => dashboard.remediation_strategy(&report.value).await,
    };
    render::source_notice(text.source, options.quiet);

    if options.json {
        return render::print_json(&text);
    }
    println!("{}", text.value);
    Ok(())
}

async fn handle_analyze(options: &GlobalOptions) -> anyhow::Result<()> {
    let dashboard = options.dashboard()?;
    let message = dashboard.run_analysis().await;
    render::source_notice(message.source, options.quiet);

    if options.json {
        return render::print_json(&message);
    }
    println!("{}", message.value);
    Ok(())
}

fn handle_config(action: ConfigAction, options: &GlobalOptions) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let (path, created) = write_default_config(&options.workspace)?;
            if created {
                println!("Created default configuration at: {}", path.display());
            } else {
                println!("Configuration file already exists at: {}", path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = options.config()?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}
