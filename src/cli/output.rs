//! Terminal output for the Courier CLI.
//!
//! Status lines share one layout: a marker, then the message. With color
//! the marker is a glyph; without it the marker is a bracketed tag so logs
//! and pipes stay readable.

use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};

/// Kind of status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Info,
    Warning,
    Error,
    Skipped,
}

impl Tone {
    fn glyph(self) -> &'static str {
        match self {
            Tone::Success => "✓",
            Tone::Info => "•",
            Tone::Warning => "!",
            Tone::Error => "✗",
            Tone::Skipped => "○",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Tone::Success => "[OK]",
            Tone::Info => "[INFO]",
            Tone::Warning => "[WARN]",
            Tone::Error => "[ERROR]",
            Tone::Skipped => "[SKIP]",
        }
    }

    fn style(self) -> Style {
        match self {
            Tone::Success => Style::new().green().bold(),
            Tone::Info => Style::new().blue(),
            Tone::Warning => Style::new().yellow().bold(),
            Tone::Error => Style::new().red().bold(),
            Tone::Skipped => Style::new().dimmed(),
        }
    }
}

/// Output style configuration
#[derive(Debug, Clone, Copy)]
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Renders one status line without printing it.
    pub fn status_line(&self, tone: Tone, message: &str) -> String {
        if self.colored {
            format!("  {} {}", tone.glyph().style(tone.style()), message)
        } else {
            format!("  {} {}", tone.tag(), message)
        }
    }

    fn status(&self, tone: Tone, message: &str) {
        let line = self.status_line(tone, message);
        if tone == Tone::Error {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    pub fn banner(&self) {
        let version = env!("CARGO_PKG_VERSION");
        if self.colored {
            println!(
                "\n  {} {} {}\n",
                "courier".bright_cyan().bold(),
                format!("v{}", version).dimmed(),
                "· chat relay".dimmed()
            );
        } else {
            println!("\n  courier v{} - chat relay\n", version);
        }
    }

    pub fn success(&self, message: &str) {
        self.status(Tone::Success, message);
    }

    pub fn info(&self, message: &str) {
        self.status(Tone::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.status(Tone::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.status(Tone::Error, message);
    }

    /// A scaffolded file, labelled by what it is for.
    pub fn created(&self, kind: &str, path: &str) {
        self.status(Tone::Success, &format!("{:<7}{}", kind, path));
    }

    pub fn skipped(&self, path: &str, reason: &str) {
        self.status(Tone::Skipped, &format!("{} ({})", path, reason));
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bold().underline());
        } else {
            println!("\n  == {} ==", title);
        }
    }

    /// Aligned `key: value` row, used for settings and listen addresses.
    pub fn kv(&self, key: &str, value: &str) {
        let key = format!("{}:", key);
        if self.colored {
            println!("    {:<15} {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {:<15} {}", key, value);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  hint: {}", message);
        }
    }

    /// A shell command the user can copy.
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("      {} {}", "$".dimmed(), cmd.cyan());
        } else {
            println!("      $ {}", cmd);
        }
    }

    pub fn complete(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.bright_green().bold());
        } else {
            println!("\n  {}", message);
        }
    }

    /// Chat input prompt, left on the same line as the user's typing.
    pub fn prompt(&self) {
        self.label("you", false);
    }

    /// Label printed before a bot reply is typed out.
    pub fn bot_label(&self) {
        self.label("bot", true);
    }

    fn label(&self, who: &str, bot: bool) {
        let mut stdout = io::stdout();
        let result = match (self.colored, bot) {
            (true, false) => write!(stdout, "{} ", format!("{} ›", who).bright_cyan().bold()),
            (true, true) => write!(stdout, "{} ", format!("{} ›", who).bright_magenta().bold()),
            (false, _) => write!(stdout, "{} > ", who),
        };
        if result.is_ok() {
            stdout.flush().ok();
        }
    }

    pub fn newline(&self) {
        println!();
    }
}
