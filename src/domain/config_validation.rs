//! Configuration validation.
//!
//! Validates every config field before any data is read.

use crate::domain::error::{ParseError, SigtraderError};
use crate::domain::expression::{parse_conditions, parse_indicators, parse_names};
use crate::domain::order::Symbol;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_data_config(config)?;
    validate_analysis_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    required(config, "data", "path")?;
    validate_tail(config)?;
    Ok(())
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let indicators = required(config, "analysis", "indicators")?;
    parse_indicators(&indicators).map_err(|e| invalid_expression("indicators", &indicators, e))?;

    let conditions = required(config, "analysis", "conditions")?;
    parse_conditions(&conditions).map_err(|e| invalid_expression("conditions", &conditions, e))?;

    if let Some(signal) = optional(config, "analysis", "signal") {
        parse_names(&signal).map_err(|e| invalid_expression("signal", &signal, e))?;
    }
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_mode(config)?;
    validate_symbol(config)?;
    validate_amount(config)?;
    validate_signals(config)?;
    Ok(())
}

/// The configured value of a key, `None` when absent or blank.
pub fn optional(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, SigtraderError> {
    optional(config, section, key).ok_or_else(|| SigtraderError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    })
}

fn invalid_expression(key: &str, value: &str, e: ParseError) -> SigtraderError {
    SigtraderError::ConfigInvalid {
        section: "analysis".to_string(),
        key: key.to_string(),
        reason: e.display_with_context(value),
    }
}

fn validate_tail(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if let Some(tail) = optional(config, "data", "tail") {
        match tail.parse::<usize>() {
            Ok(n) if n > 0 => {}
            _ => {
                return Err(SigtraderError::ConfigInvalid {
                    section: "data".to_string(),
                    key: "tail".to_string(),
                    reason: "tail must be a positive integer".to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_mode(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match optional(config, "strategy", "mode").as_deref() {
        None | Some("backtest") | Some("live") => Ok(()),
        Some(other) => Err(SigtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "mode".to_string(),
            reason: format!("mode must be backtest or live, got {}", other),
        }),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let symbol = required(config, "strategy", "symbol")?;
    Symbol::parse(&symbol).map_err(|e| SigtraderError::ConfigInvalid {
        section: "strategy".to_string(),
        key: "symbol".to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn validate_amount(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    required(config, "strategy", "amount")?;
    let value = config.get_double("strategy", "amount", 0.0);
    if !(value.is_finite() && value > 0.0) {
        return Err(SigtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "amount".to_string(),
            reason: "amount must be a positive number".to_string(),
        });
    }
    if let Some(trades) = optional(config, "strategy", "trades") {
        let reason = if optional(config, "strategy", "order_size").is_some() {
            Some("trades and order_size are mutually exclusive".to_string())
        } else {
            match trades.parse::<usize>() {
                Ok(n) if n > 0 => None,
                _ => Some("trades must be a positive integer".to_string()),
            }
        };
        if let Some(reason) = reason {
            return Err(SigtraderError::ConfigInvalid {
                section: "strategy".to_string(),
                key: "trades".to_string(),
                reason,
            });
        }
    }
    if optional(config, "strategy", "order_size").is_some() {
        let size = config.get_double("strategy", "order_size", 0.0);
        if !(size.is_finite() && size > 0.0) {
            return Err(SigtraderError::ConfigInvalid {
                section: "strategy".to_string(),
                key: "order_size".to_string(),
                reason: "order_size must be a positive number".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_signals(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let buy = optional(config, "strategy", "buy_signal");
    let sell = optional(config, "strategy", "sell_signal");
    if buy.is_none() && sell.is_none() {
        return Err(SigtraderError::ConfigMissing {
            section: "strategy".to_string(),
            key: "buy_signal".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::error::ErrorKind;

    const VALID: &str = r#"
[data]
path = klines.csv
tail = 400

[analysis]
indicators = SMA(2), RSI(14)
conditions = SMA_2>2, RSI_14<70, ALL(SMA_2>2, RSI_14<70)
signal = SMA_2>2

[strategy]
mode = backtest
symbol = BTC/USDT
amount = 1000
buy_signal = SignalAllConditionsTrue
"#;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn with_line(section: &str, line: &str) -> FileConfigAdapter {
        let header = format!("[{}]\n", section);
        make_config(&VALID.replacen(&header, &format!("{}{}\n", header, line), 1))
    }

    fn assert_invalid(config: &FileConfigAdapter, expected_key: &str) {
        match validate_config(config) {
            Err(SigtraderError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected invalid {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_passes() {
        validate_config(&make_config(VALID)).unwrap();
    }

    #[test]
    fn missing_path_fails() {
        let config = make_config(&VALID.replace("path = klines.csv\n", ""));
        match validate_config(&config) {
            Err(SigtraderError::ConfigMissing { section, key }) => {
                assert_eq!(section, "data");
                assert_eq!(key, "path");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn tail_must_be_positive() {
        assert_invalid(&make_config(&VALID.replace("tail = 400", "tail = 0")), "tail");
        assert_invalid(&make_config(&VALID.replace("tail = 400", "tail = many")), "tail");
    }

    #[test]
    fn indicator_syntax_error_points_at_position() {
        let config = make_config(&VALID.replace("RSI(14)", "RSI(14"));
        match validate_config(&config) {
            Err(SigtraderError::ConfigInvalid { key, reason, .. }) => {
                assert_eq!(key, "indicators");
                assert!(reason.contains('^'), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zero_length_indicator_fails() {
        assert_invalid(&make_config(&VALID.replace("SMA(2)", "SMA(0)")), "indicators");
    }

    #[test]
    fn condition_syntax_error_fails() {
        assert_invalid(&make_config(&VALID.replace("RSI_14<70,", "RSI_14 ~ 70,")), "conditions");
    }

    #[test]
    fn unknown_mode_fails() {
        assert_invalid(&make_config(&VALID.replace("mode = backtest", "mode = paper")), "mode");
    }

    #[test]
    fn mode_defaults_to_backtest() {
        validate_config(&make_config(&VALID.replace("mode = backtest\n", ""))).unwrap();
    }

    #[test]
    fn bad_symbol_fails() {
        assert_invalid(&make_config(&VALID.replace("BTC/USDT", "BTCUSDT")), "symbol");
    }

    #[test]
    fn amount_must_be_positive() {
        assert_invalid(&make_config(&VALID.replace("amount = 1000", "amount = -5")), "amount");
        assert_invalid(&make_config(&VALID.replace("amount = 1000", "amount = lots")), "amount");
    }

    #[test]
    fn order_size_must_be_positive() {
        assert_invalid(&with_line("strategy", "order_size = 0"), "order_size");
    }

    #[test]
    fn trades_must_be_positive_and_alone() {
        validate_config(&with_line("strategy", "trades = 4")).unwrap();
        assert_invalid(&with_line("strategy", "trades = 0"), "trades");
        assert_invalid(&with_line("strategy", "trades = 1.5"), "trades");
        assert_invalid(
            &with_line("strategy", "trades = 4\norder_size = 0.5"),
            "trades",
        );
    }

    #[test]
    fn at_least_one_signal_required() {
        let config = make_config(&VALID.replace("buy_signal = SignalAllConditionsTrue\n", ""));
        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let sell_only = VALID.replace(
            "buy_signal = SignalAllConditionsTrue",
            "sell_signal = SMA_2>2",
        );
        validate_config(&make_config(&sell_only)).unwrap();
    }
}
