use crate::models::score_card::{Metric, ScoreCard};
use std::fmt::Write;

// Numbers always carry three decimals, so the object is assembled by hand.
pub fn format_record(source_url: &str, card: &ScoreCard) -> String {
    let url = serde_json::Value::String(source_url.trim().to_string());
    let mut out = format!(
        "{{\"URL\":{url},\"NetScore\":{:.3},\"NetScore_Latency\":{:.3}",
        card.net_score, card.net_score_latency_seconds
    );

    for metric in Metric::ALL {
        let (value, latency) = card
            .metrics
            .get(&metric)
            .map(|r| (r.value, r.latency_seconds))
            .unwrap_or((0.0, 0.0));
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            ",\"{key}\":{value:.3},\"{key}_Latency\":{latency:.3}",
            key = metric.key()
        );
    }

    out.push_str("}\n");
    out
}

pub fn format_unratable(source_url: &str) -> String {
    format_record(source_url, &ScoreCard::unratable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::score_card::MetricResult;
    use serde_json::Value;

    const KEY_ORDER: [&str; 17] = [
        "URL",
        "NetScore",
        "NetScore_Latency",
        "RampUp",
        "RampUp_Latency",
        "Correctness",
        "Correctness_Latency",
        "BusFactor",
        "BusFactor_Latency",
        "ResponsiveMaintainer",
        "ResponsiveMaintainer_Latency",
        "License",
        "License_Latency",
        "PullRequestsCodeMetric",
        "PullRequestsCodeMetric_Latency",
        "DependencyPinning",
        "DependencyPinning_Latency",
    ];

    fn sample_card() -> ScoreCard {
        ScoreCard {
            metrics: Metric::ALL
                .into_iter()
                .enumerate()
                .map(|(i, m)| {
                    (
                        m,
                        MetricResult {
                            value: i as f64 / 7.0,
                            latency_seconds: 0.0123 * (i + 1) as f64,
                        },
                    )
                })
                .collect(),
            net_score: 0.428571,
            net_score_latency_seconds: 0.0004,
        }
    }

    fn keys_in_order(record: &str) -> Vec<String> {
        record
            .trim_end()
            .trim_start_matches('{')
            .trim_end_matches('}')
            .split(",\"")
            .map(|pair| pair.trim_start_matches('"').split('"').next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn emits_fixed_key_order_and_newline() {
        let record = format_record("https://github.com/acme/widget", &sample_card());
        assert!(record.ends_with("}\n"));
        assert_eq!(record.matches('\n').count(), 1);
        assert_eq!(keys_in_order(&record), KEY_ORDER);
    }

    #[test]
    fn numbers_have_three_decimals_and_round_trip() {
        let card = sample_card();
        let record = format_record("  https://github.com/acme/widget \n", &card);
        assert!(record.contains("\"NetScore\":0.429,"));
        assert!(record.contains("\"NetScore_Latency\":0.000,"));

        let parsed: Value = serde_json::from_str(&record).unwrap();
        assert_eq!(parsed["URL"], "https://github.com/acme/widget");
        for metric in Metric::ALL {
            let expected = card.metrics[&metric];
            let value = parsed[metric.key()].as_f64().unwrap();
            let latency = parsed[format!("{}_Latency", metric.key())].as_f64().unwrap();
            assert!((value - expected.value).abs() <= 0.0005 + 1e-12);
            assert!((latency - expected.latency_seconds).abs() <= 0.0005 + 1e-12);
        }
    }

    #[test]
    fn unratable_record_is_all_sentinels() {
        let record = format_unratable("https://www.npmjs.com/package/left-pad");
        let parsed: Value = serde_json::from_str(&record).unwrap();
        for key in &KEY_ORDER[1..] {
            assert_eq!(parsed[*key].as_f64(), Some(-1.0), "{key}");
        }
        assert!(record.contains("\"BusFactor\":-1.000,"));
    }

    #[test]
    fn url_is_json_escaped() {
        let record = format_record("https://example.com/\"quoted\"", &sample_card());
        let parsed: Value = serde_json::from_str(&record).unwrap();
        assert_eq!(parsed["URL"], "https://example.com/\"quoted\"");
    }
}
