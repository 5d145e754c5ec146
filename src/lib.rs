// 自身を `::weave` として参照できるようにする（derive 生成コード用）
extern crate self as weave;

pub mod engine;

use std::env;
use log::info;

pub use engine::aspect::{Aspect, AroundFn, Proceed, resolve_target};
pub use engine::error::{AspectError, AspectResult, CallError};
pub use engine::object::{AdviceMarks, Function, MemberTable, NativeFn, Object, SharedTable, Surface};
pub use engine::options::AspectOptions;
pub use engine::selector::Selector;
pub use engine::slots::Slots;
pub use engine::unique::UniqueVec;
pub use engine::value::{CallResult, FromValue, Value, arg};
pub use weave_slots_derive::Slots;

// ========================================
// コマンドライン引数構造体
// ========================================

/// コマンドライン引数の設定
#[derive(Debug)]
pub struct CliArgs {
    pub strict: bool,     // デモのアドバイスを strict で適用
    pub quiet: bool,      // panic以外のログを抑制
    pub show_help: bool,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Off,      // ログを一切表示しない（panicは除く）
    Error,    // エラーレベルのみ
    Warn,     // 警告レベル以上
    Info,     // 情報レベル以上
    Debug,    // デバッグレベル以上
    Trace,    // 全てのログ
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            strict: false,
            quiet: false,
            show_help: false,
            log_level: LogLevel::Info,
        }
    }
}

impl CliArgs {
    /// デモで使うアドバイスオプション
    pub fn aspect_options(&self) -> AspectOptions {
        AspectOptions::new().with_strict(self.strict)
    }
}

pub fn parse_args() -> CliArgs {
    parse_args_from(env::args().skip(1))
}

pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut cli_args = CliArgs::default();

    for arg in args {
        match arg.as_ref() {
            "--strict" => cli_args.strict = true,
            "--no-strict" => cli_args.strict = false,
            "--quiet" | "-q" | "--silent" => {
                cli_args.quiet = true;
                cli_args.log_level = LogLevel::Off;
            }
            "--log-level=off" => cli_args.log_level = LogLevel::Off,
            "--log-level=error" => cli_args.log_level = LogLevel::Error,
            "--log-level=warn" => cli_args.log_level = LogLevel::Warn,
            "--log-level=info" => cli_args.log_level = LogLevel::Info,
            "--log-level=debug" => cli_args.log_level = LogLevel::Debug,
            "--log-level=trace" => cli_args.log_level = LogLevel::Trace,
            "--help" | "-h" => cli_args.show_help = true,
            _ => {}
        }
    }
    cli_args
}

pub fn show_help() {
    info!("Weave Advice Demo

USAGE:
    weave [OPTIONS]

OPTIONS:
    --strict/--no-strict     Fail when a selector matches no method (default: off)
    --quiet, -q              Suppress all logs except panics
    --silent                 Same as --quiet
    --log-level=LEVEL        Set log level (off/error/warn/info/debug/trace)
    --help, -h               Show this help");
}

/// 依存クレート側に許すログレベルの上限
///
/// weave 自身は指定レベルで出力し、依存クレート（regex など）は Warn までに抑える。
pub fn dependency_level(log_level: &LogLevel) -> log::LevelFilter {
    std::cmp::min(to_level_filter(log_level), log::LevelFilter::Warn)
}

fn to_level_filter(log_level: &LogLevel) -> log::LevelFilter {
    use log::LevelFilter;

    match log_level {
        LogLevel::Off => LevelFilter::Off,
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

/// ログレベルを初期化する関数
///
/// RUST_LOG が設定されている場合はそちらを優先し、フィルタを上書きしない。
pub fn init_logger(log_level: &LogLevel) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::sync::Once;

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let mut builder = Builder::from_default_env();

        if matches!(log_level, LogLevel::Off) {
            // quietモードの場合、何も出力しない（panicは別途処理される）
            builder
                .filter_level(LevelFilter::Off)
                .format(|_, _| Ok(()))
                .try_init()
                .ok(); // エラーを無視
            return;
        }

        if env::var_os("RUST_LOG").is_none() {
            builder
                .filter_level(dependency_level(log_level))
                .filter_module("weave", to_level_filter(log_level));
        }
        builder
            .format_timestamp_secs()
            .format_module_path(false)
            .try_init()
            .ok(); // エラーを無視
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_defaults() {
        let args = parse_args_from(Vec::<String>::new());
        assert!(!args.strict);
        assert!(!args.show_help);
        assert_eq!(args.log_level, LogLevel::Info);
        assert_eq!(args.aspect_options(), AspectOptions::default());
    }

    #[test]
    fn test_parse_args_flags() {
        let args = parse_args_from(["--strict", "--log-level=debug", "--unknown"]);
        assert!(args.strict);
        assert!(args.aspect_options().strict);
        assert_eq!(args.log_level, LogLevel::Debug);

        let args = parse_args_from(["--log-level=trace", "-q"]);
        assert!(args.quiet);
        assert_eq!(args.log_level, LogLevel::Off);
    }

    #[test]
    fn test_dependency_level_is_capped_at_warn() {
        use log::LevelFilter;

        assert_eq!(dependency_level(&LogLevel::Trace), LevelFilter::Warn);
        assert_eq!(dependency_level(&LogLevel::Info), LevelFilter::Warn);
        assert_eq!(dependency_level(&LogLevel::Error), LevelFilter::Error);
        assert_eq!(dependency_level(&LogLevel::Off), LevelFilter::Off);
        assert_eq!(to_level_filter(&LogLevel::Debug), LevelFilter::Debug);
    }

    #[test]
    fn test_init_logger_twice_is_harmless() {
        init_logger(&LogLevel::Off);
        init_logger(&LogLevel::Trace);
    }
}
