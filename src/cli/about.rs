//! Static information about taskboard. Never touches the store.

use serde::Serialize;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

#[derive(Serialize)]
struct Feature {
    title: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct AboutOutput {
    name: &'static str,
    version: &'static str,
    summary: &'static str,
    features: &'static [Feature],
    support: &'static str,
}

const FEATURES: &[Feature] = &[
    Feature {
        title: "Complete tracking",
        description: "Every task in one place, with categories, priorities and due dates.",
    },
    Feature {
        title: "Calendar",
        description: "Month grid with per-day drill-down of what is due.",
    },
    Feature {
        title: "Shared store",
        description: "Tasks live in a hosted table store, so every client sees the same list.",
    },
];

const SUPPORT: &str = "soporte@taskmanager.com";

pub fn run(output: OutputOptions) -> Result<()> {
    let about = AboutOutput {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        summary: "Task manager for tasks kept in a hosted table store.",
        features: FEATURES,
        support: SUPPORT,
    };

    let mut human = HumanOutput::new(format!("{} {}", about.name, about.version));
    human.push_detail(about.summary);
    for feature in about.features {
        human.push_summary(feature.title, feature.description);
    }
    human.push_summary("Support", about.support);

    emit_success(output, "about", &about, Some(&human))
}
