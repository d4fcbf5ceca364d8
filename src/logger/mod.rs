use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

/// 带颜色标签的终端日志，输出到stderr，避免和结果表格混在一起
pub struct Logger {
    use_colors: bool,
    max_level: LevelFilter,
    labels: HashMap<Level, &'static str>,
    mutex: Mutex<()>,
}

impl Logger {
    pub fn new(max_level: LevelFilter) -> Self {
        let mut labels = HashMap::new();
        labels.insert(Level::Error, "Error");
        labels.insert(Level::Warn, "Warning");
        labels.insert(Level::Info, "INFO");
        labels.insert(Level::Debug, "DEBUG");
        labels.insert(Level::Trace, "TRACE");

        Logger {
            use_colors: true,
            max_level,
            labels,
            mutex: Mutex::new(()),
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn wrap(&self, label: &str, level: Level) -> String {
        if !self.use_colors {
            return label.to_string();
        }

        match level {
            Level::Error => label.red().to_string(),
            Level::Warn => label.yellow().to_string(),
            Level::Info => label.blue().to_string(),
            Level::Debug => label.magenta().to_string(),
            Level::Trace => label.normal().to_string(),
        }
    }

    /// 格式化一条日志，不含换行
    pub fn format(&self, level: Level, args: &std::fmt::Arguments) -> String {
        match self.labels.get(&level) {
            Some(label) => format!("[{}] {}", self.wrap(label, level), args),
            None => args.to_string(),
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.format(record.level(), record.args());
        let _guard = self.mutex.lock();
        let _ = writeln!(std::io::stderr(), "{}", line);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// 安装全局日志，只能调用一次
pub fn init_logger(max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(Logger::new(max_level)))?;
    log::set_max_level(max_level);
    Ok(())
}

/// 根据命令行开关选择日志级别
pub fn level_for(verbose: bool, silent: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else if silent {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    }
}
