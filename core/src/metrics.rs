//! Metric families and their Prometheus text exposition.
//!
//! Every family is a gauge recomputed on each scrape. Samples are rendered in
//! the fixed order of [`Family::ALL`] and keep their emission order inside a
//! family. Families without samples are left out entirely.

use std::fmt::Write;

use crate::collector::TargetReport;

pub const NAMESPACE: &str = "network_access";
pub const EXPORTER_NAME: &str = "network_access_exporter";

/// Content type of [`render`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Allowed,
    LookupError,
    LookupDuration,
    DialDuration,
    BuildInfo,
}

impl Family {
    /// Exposition order.
    pub const ALL: [Family; 5] = [
        Family::Allowed,
        Family::LookupError,
        Family::LookupDuration,
        Family::DialDuration,
        Family::BuildInfo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Family::Allowed => "network_access_allowed",
            Family::LookupError => "network_access_lookup_error",
            Family::LookupDuration => "network_access_lookup_duration_seconds",
            Family::DialDuration => "network_access_dial_duration_seconds",
            Family::BuildInfo => "network_access_exporter_build_info",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Family::Allowed => "Whether a TCP connection to the resolved address succeeded (1) or not (0).",
            Family::LookupError => "Set to 1 when resolving the resource failed during this scrape.",
            Family::LookupDuration => "Time spent resolving the resource, in seconds.",
            Family::DialDuration => "Time spent on a successful TCP connection, in seconds.",
            Family::BuildInfo => "A metric with a constant '1' value labeled by the exporter version.",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub family: Family,
    /// Label pairs in exposition order.
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
}

impl Sample {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Samples describing one target report, in emission order.
pub fn samples_for(report: &TargetReport<'_>) -> Vec<Sample> {
    let target = report.target();
    let base = vec![
        ("resource", target.resource().to_string()),
        ("alias", target.alias().to_string()),
        ("group", target.group().to_string()),
        ("iface", target.iface().unwrap_or_default().to_string()),
    ];

    match report {
        TargetReport::LookupFailed { .. } => vec![Sample {
            family: Family::LookupError,
            labels: base,
            value: 1.0,
        }],
        TargetReport::Probed {
            lookup_duration,
            results,
            ..
        } => {
            let mut samples = Vec::with_capacity(1 + results.len() * 2);
            samples.push(Sample {
                family: Family::LookupDuration,
                labels: base.clone(),
                value: lookup_duration.as_secs_f64(),
            });

            for result in results {
                let mut labels = base.clone();
                labels.push(("ip", result.ip.to_string()));
                labels.push(("ipv6", if result.ipv6 { "1" } else { "0" }.to_string()));

                if let Some(elapsed) = result.dial_duration {
                    samples.push(Sample {
                        family: Family::DialDuration,
                        labels: labels.clone(),
                        value: elapsed.as_secs_f64(),
                    });
                }
                samples.push(Sample {
                    family: Family::Allowed,
                    labels,
                    value: if result.available { 1.0 } else { 0.0 },
                });
            }
            samples
        }
    }
}

pub fn build_info() -> Sample {
    Sample {
        family: Family::BuildInfo,
        labels: vec![("version", env!("CARGO_PKG_VERSION").to_string())],
        value: 1.0,
    }
}

/// Renders samples in the Prometheus text exposition format.
pub fn render(samples: &[Sample]) -> String {
    let mut out = String::new();

    for family in Family::ALL {
        let mut members = samples.iter().filter(|s| s.family == family).peekable();
        if members.peek().is_none() {
            continue;
        }

        let name = family.name();
        let _ = writeln!(out, "# HELP {name} {}", family.help());
        let _ = writeln!(out, "# TYPE {name} gauge");
        for sample in members {
            out.push_str(name);
            if !sample.labels.is_empty() {
                out.push('{');
                for (i, (key, value)) in sample.labels.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{key}=\"{}\"", escape_label_value(value));
                }
                out.push('}');
            }
            let _ = writeln!(out, " {}", sample.value);
        }
    }

    out
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}
