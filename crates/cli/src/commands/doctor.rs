use quizlite_core::config::{AppConfig, CatalogSource, LoadOptions};
use quizlite_core::store::ConfigStore;
use serde::Serialize;

use super::{CommandResult, EXIT_CONFIG, EXIT_DOCUMENT};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
    #[serde(skip)]
    exit_code: u8,
}

pub fn run(options: LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code: report.exit_code, output }
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();
    let mut exit_code = 0;

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            let document_checks = check_quiz_document(&config);
            if document_checks.iter().any(|check| check.status == CheckStatus::Fail) {
                exit_code = EXIT_DOCUMENT;
            }
            checks.extend(document_checks);
            checks.push(check_catalog(&config));
        }
        Err(error) => {
            exit_code = EXIT_CONFIG;
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["quiz_document", "quiz_lint", "catalog"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let overall_status = if checks.iter().any(|check| check.status == CheckStatus::Fail) {
        CheckStatus::Fail
    } else if checks.iter().any(|check| check.status == CheckStatus::Warn) {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };
    let summary = match overall_status {
        CheckStatus::Pass => "doctor: all checks passed",
        CheckStatus::Warn => "doctor: checks passed with warnings",
        _ => "doctor: one or more checks failed",
    }
    .to_string();

    DoctorReport { overall_status, summary, checks, exit_code }
}

fn check_quiz_document(config: &AppConfig) -> Vec<DoctorCheck> {
    let store = ConfigStore::new(&config.quiz.document_path);
    let quiz = match store.load() {
        Ok(quiz) => quiz,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "quiz_document",
                    status: CheckStatus::Fail,
                    details: error.to_string(),
                },
                DoctorCheck {
                    name: "quiz_lint",
                    status: CheckStatus::Skipped,
                    details: "skipped because the quiz document did not load".to_string(),
                },
            ];
        }
    };

    let loaded = DoctorCheck {
        name: "quiz_document",
        status: CheckStatus::Pass,
        details: format!(
            "`{}` loaded: {} questions, {} rules, {} combos",
            store.path().display(),
            quiz.question_count(),
            quiz.rules.len(),
            quiz.combos.len()
        ),
    };

    let issues = quiz.lint();
    let lint = if issues.is_empty() {
        DoctorCheck {
            name: "quiz_lint",
            status: CheckStatus::Pass,
            details: "no issues found".to_string(),
        }
    } else {
        let rendered: Vec<String> =
            issues.iter().map(|issue| format!("{}: {}", issue.code, issue.message)).collect();
        DoctorCheck { name: "quiz_lint", status: CheckStatus::Warn, details: rendered.join("; ") }
    };

    vec![loaded, lint]
}

fn check_catalog(config: &AppConfig) -> DoctorCheck {
    match config.catalog.effective_source() {
        Some(source) => DoctorCheck {
            name: "catalog",
            status: CheckStatus::Pass,
            details: format!("product details enriched via {source:?}"),
        },
        None if config.catalog.source == CatalogSource::Disabled => DoctorCheck {
            name: "catalog",
            status: CheckStatus::Pass,
            details: "catalog lookups disabled; results list handles only".to_string(),
        },
        None => DoctorCheck {
            name: "catalog",
            status: CheckStatus::Warn,
            details: format!(
                "catalog source {:?} is missing its shop or token; results will list handles only",
                config.catalog.source
            ),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
