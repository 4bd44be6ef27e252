use std::fmt::Display;

use colored::Colorize;

pub fn header(title: &str) {
    println!("{}", format!("=== {title} ===").blue().bold());
}

pub fn success(message: impl Display) {
    println!("{}", format!("✅ {message}").green());
}

pub fn warning(message: impl Display) {
    println!("{}", format!("⚠️  {message}").yellow());
}

pub fn failure(message: impl Display) {
    println!("{}", format!("❌ {message}").red());
}

pub fn enabled(label: &str) {
    println!("{}", format!("🟢 {label}: Enabled").green());
}

pub fn disabled(label: &str) {
    println!("{}", format!("🔴 {label}: Disabled").red());
}

pub fn unreadable(label: &str, reason: &str) {
    println!("{}", format!("🔴 {label}: {reason}").red());
}

pub fn detail(line: impl Display) {
    println!("   {line}");
}

pub fn banner(message: &str, ok: bool) {
    if ok {
        println!("{}", format!("🎉 {message}").green().bold());
    } else {
        println!("{}", format!("❌ {message}").red().bold());
    }
}
