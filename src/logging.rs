use chrono::{format::DelayedFormat, DateTime, Local, NaiveDate};
use crossbeam_channel::{unbounded, Receiver, Sender};
use once_cell::sync::Lazy;
use std::{
    fmt::Write as _,
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    thread,
};

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("default"));

/// 以通道解耦的檔案記錄器
///
/// Messages travel through an unbounded channel to a dedicated writer thread,
/// so logging callers never touch the disk. One file per logger name per day
/// under `log/`; the writer rolls to a new file when the date changes.
pub struct Logger {
    writer: Sender<LogMessage>,
}

impl Logger {
    pub(crate) fn new(log_name: &str) -> Self {
        let (tx, rx) = unbounded::<LogMessage>();
        let name = log_name.to_string();

        thread::spawn(move || writer_loop(&name, rx));

        Logger { writer: tx }
    }

    pub(crate) fn info(&self, log: String) {
        self.send(log::Level::Info, log);
    }

    pub(crate) fn error(&self, log: String) {
        self.send(log::Level::Error, log);
    }

    pub(crate) fn debug(&self, log: String) {
        self.send(log::Level::Debug, log);
    }

    fn send(&self, level: log::Level, msg: String) {
        if let Err(why) = self.writer.send(LogMessage::new(level, msg)) {
            error_console(why.to_string());
        }
    }
}

const FLUSH_THRESHOLD: usize = 4096;

fn writer_loop(log_name: &str, rx: Receiver<LogMessage>) {
    let mut current_date = Local::now().date_naive();
    let mut writer = open_log_file(log_name, current_date);
    let mut line = String::with_capacity(FLUSH_THRESHOLD);

    while let Ok(received) = rx.recv() {
        let received_date = received.created_at.date_naive();
        if received_date != current_date {
            current_date = received_date;
            writer = open_log_file(log_name, current_date);
        }

        if writeln!(
            &mut line,
            "{} {} {}",
            received.created_at.format("%F %X%.6f"),
            received.level,
            received.msg
        )
        .is_err()
        {
            continue;
        }

        // batch while more messages are queued, flush once the channel drains
        if rx.is_empty() || line.len() >= FLUSH_THRESHOLD {
            match writer.as_mut() {
                Some(w) => {
                    if w.write_all(line.as_bytes()).is_err() || w.flush().is_err() {
                        info_console(line.clone());
                    }
                }
                None => info_console(line.clone()),
            }

            line.clear();
        }
    }
}

fn open_log_file(log_name: &str, date: NaiveDate) -> Option<BufWriter<File>> {
    let dir = Path::new("log");
    if !dir.exists() {
        fs::create_dir_all(dir).ok()?;
    }

    let mut path = PathBuf::from(dir);
    path.push(format!("{}_{}.log", log_name, date.format("%Y-%m-%d")));

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(BufWriter::new)
        .ok()
}

pub struct LogMessage {
    pub level: log::Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: log::Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }
}

pub fn info_file_async(log: String) {
    LOGGER.info(log);
}

pub fn error_file_async(log: String) {
    LOGGER.error(log);
}

pub fn debug_file_async(log: String) {
    LOGGER.debug(log);
}

pub fn info_console(log: String) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn error_console(log: String) {
    println!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log
    );
}
