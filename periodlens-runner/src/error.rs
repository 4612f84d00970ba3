//! Report-generation errors, each naming the sheet, stage and period involved.

use periodlens_core::data::DataError;
use periodlens_core::domain::PeriodLabel;
use periodlens_core::engine::{Component, EngineError};

use crate::config::ConfigError;

/// Why a report (and therefore its whole workbook) could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("loading period '{period}': {source}")]
    Load {
        period: PeriodLabel,
        #[source]
        source: DataError,
    },

    #[error("sheet '{sheet}': {component} failed{}: {source}", period_suffix(.period))]
    Stage {
        sheet: String,
        component: Component,
        period: Option<PeriodLabel>,
        #[source]
        source: EngineError,
    },
}

impl ReportError {
    pub(crate) fn stage(sheet: &str, component: Component, period: Option<&PeriodLabel>) -> impl FnOnce(EngineError) -> Self {
        let sheet = sheet.to_string();
        let period = period.cloned();
        move |source| ReportError::Stage {
            sheet,
            component,
            period,
            source,
        }
    }

    /// The pipeline stage that failed, if the error came from the engine.
    pub fn component(&self) -> Option<Component> {
        match self {
            ReportError::Stage { component, .. } => Some(*component),
            ReportError::Load { .. } => Some(Component::Loader),
            ReportError::Config(_) => None,
        }
    }
}

fn period_suffix(period: &Option<PeriodLabel>) -> String {
    match period {
        Some(p) => format!(" for period '{p}'"),
        None => String::new(),
    }
}
