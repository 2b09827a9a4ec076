#![cfg(not(tarpaulin_include))]

use clap::Parser;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};

use studyflow::config::FocusConfig;
use studyflow::pomodoro::{Mode, Notification, Notifier, PomodoroTimer};
use studyflow::ticker::Ticker;

/// Prints notifications straight to the terminal.
struct PrintNotifier;

impl Notifier for PrintNotifier {
    fn notify(&self, notification: &Notification) {
        println!("\n*** {} ***\n{}", notification.title, notification.body);
        prompt();
    }
}

fn prompt() {
    print!("focus> ");
    let _ = io::stdout().flush();
}

fn print_help() {
    println!("Commands:");
    println!("  start [task-id]   start or resume the countdown");
    println!("  pause             pause the countdown");
    println!("  stop              stop and refill the current interval");
    println!("  reset             back to a stopped pomodoro");
    println!("  reset-all         reset and clear the completed count");
    println!("  mode <pomodoro|short|long>");
    println!("  status            show the timer");
    println!("  q                 quit");
}

fn parse_mode(raw: &str) -> Option<Mode> {
    match raw {
        "pomodoro" | "focus" => Some(Mode::Pomodoro),
        "short" | "shortBreak" => Some(Mode::ShortBreak),
        "long" | "longBreak" => Some(Mode::LongBreak),
        _ => None,
    }
}

fn status_line(timer: &PomodoroTimer) -> String {
    let snapshot = timer.snapshot();
    format!(
        "[{}] {:02}:{:02} {} | completed {}",
        snapshot.mode,
        snapshot.minutes,
        snapshot.seconds,
        if snapshot.running { "running" } else { "stopped" },
        snapshot.completed_pomodoros
    )
}

/// Run one command against the timer.
///
/// # Returns
/// * `Result<String, String>` - Status line to show, or an error message
fn execute(timer: &Mutex<PomodoroTimer>, command: &str) -> Result<String, String> {
    let mut timer = timer.lock().map_err(|_| "timer unavailable".to_string())?;
    let mut words = command.split_whitespace();

    match words.next() {
        Some("start") => {
            if let Some(raw) = words.next() {
                let task_id = raw.parse().map_err(|_| format!("invalid task id: {}", raw))?;
                timer.select_task(Some(task_id));
            }
            timer.start();
        }
        Some("pause") => {
            timer.pause();
        }
        Some("stop") => timer.stop(),
        Some("reset") => timer.reset(),
        Some("reset-all") => timer.reset_all(),
        Some("mode") => {
            let raw = words.next().unwrap_or_default();
            let mode = parse_mode(raw).ok_or_else(|| format!("unknown mode: {}", raw))?;
            timer.set_mode(mode);
        }
        Some("status") | None => {}
        Some(other) => return Err(format!("unknown command: {}", other)),
    }

    Ok(status_line(&timer))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = FocusConfig::parse();
    let settings = config.timer.settings();
    settings.validate()?;
    let timer = Arc::new(Mutex::new(
        PomodoroTimer::new(settings).with_notifier(PrintNotifier),
    ));
    let ticker = Ticker::spawn(Arc::clone(&timer));

    print_help();
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = line.trim();
        match command {
            "q" | "quit" => break,
            "help" => print_help(),
            _ => match execute(&timer, command) {
                Ok(status) => println!("{}", status),
                Err(message) => println!("error: {}", message),
            },
        }
        prompt();
    }

    ticker.shutdown().await;
    Ok(())
}
