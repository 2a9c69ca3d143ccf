use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};

/// Asks before a destructive action unless `force` is set.
pub fn confirm_deletion(prompt: &str, force: bool) -> bool {
    if force {
        return true;
    }

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false);
    if !confirmed {
        println!("Deletion cancelled.");
    }
    confirmed
}

pub fn print_success(message: &str, id: i64) {
    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    println!("{} {}", "✓".style(success_style), message.bright_white().bold());
    println!("  {} ID: {}", "→".style(info_style), id.to_string().yellow());
}

pub fn print_hint(text: &str) {
    let subtle_style = Style::new().bright_black();
    println!("   {} {}", "•".style(subtle_style), text);
}
