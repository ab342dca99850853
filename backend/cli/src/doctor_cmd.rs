//! CLI Doctor Command
//!
//! Checks that the pieces a download needs are actually usable.

use std::time::Duration;

use anyhow::Result;
use fetchbot_config::{FetchbotConfig, ValidationReport};
use tokio::process::Command;

/// Runs every check and prints a summary. Returns whether all passed.
pub async fn run(config: &FetchbotConfig, report: &ValidationReport) -> Result<bool> {
    println!("\nRunning fetchbot doctor...\n");

    let mut ok = check_report(report);
    ok &= check_download_folder(config).await;
    ok &= check_video_binary(config).await;
    check_whatsapp(config);

    println!();
    if ok {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Please fix the errors above.");
    }
    Ok(ok)
}

fn check_report(report: &ValidationReport) -> bool {
    println!("Config:");
    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("  🟢 no problems found");
    }
    for w in &report.warnings {
        println!("  🟡 {}: {}", w.path, w.message);
    }
    for e in &report.errors {
        println!("  🔴 {}: {}", e.path, e.message);
    }
    report.is_valid()
}

async fn check_download_folder(config: &FetchbotConfig) -> bool {
    let folder = config.downloads.folder();
    println!("Download folder ({}):", folder.display());

    let marker = folder.join(".fetchbot-doctor");
    let result = async {
        tokio::fs::create_dir_all(&folder).await?;
        tokio::fs::write(&marker, b"ok").await?;
        tokio::fs::remove_file(&marker).await
    }
    .await;

    match result {
        Ok(()) => {
            println!("  🟢 writable");
            true
        }
        Err(e) => {
            println!("  🔴 not writable: {e}");
            false
        }
    }
}

async fn check_video_binary(config: &FetchbotConfig) -> bool {
    let binary = config.video.binary();
    println!("Video fetcher ({}):", binary.display());

    let output = tokio::time::timeout(
        Duration::from_secs(15),
        Command::new(&binary).arg("--version").kill_on_drop(true).output(),
    )
    .await;

    match output {
        Ok(Ok(out)) if out.status.success() => {
            println!("  🟢 version {}", String::from_utf8_lossy(&out.stdout).trim());
            true
        }
        Ok(Ok(out)) => {
            println!("  🔴 exited with {}", out.status);
            false
        }
        Ok(Err(e)) => {
            println!("  🔴 cannot run: {e}");
            false
        }
        Err(_) => {
            println!("  🔴 timed out");
            false
        }
    }
}

/// Informational only; the console and `fetch` work without WhatsApp.
fn check_whatsapp(config: &FetchbotConfig) {
    println!("WhatsApp:");
    let Some(wa) = &config.whatsapp else {
        println!("  ⚪ not configured (webhook disabled)");
        return;
    };
    let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    for (name, present) in [
        ("token", set(&wa.token)),
        ("phoneNumberId", set(&wa.phone_number_id)),
        ("verifyToken", set(&wa.verify_token)),
    ] {
        if present {
            println!("  🟢 {name} is set");
        } else {
            println!("  🟡 {name} is missing");
        }
    }
    println!("  ⚪ webhook path {}", wa.webhook_path());
}
