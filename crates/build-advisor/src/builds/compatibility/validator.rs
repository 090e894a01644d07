use tracing::debug;

use super::{CompatibilityIssue, IssueKind};
use crate::builds::domain::{Build, Component, ComponentType};
use crate::builds::normalizer::sockets_compatible;

pub const HEADROOM_FACTOR: f64 = 1.2;
pub const BASE_SYSTEM_WATTS: f64 = 150.0;
pub const CPU_WATTS: f64 = 100.0;
const GPU_BASE_WATTS: f64 = 75.0;
const GPU_WATTS_PER_GB: f64 = 20.0;

/// Run every check; one issue per failed rule.
pub fn validate(build: &Build) -> Vec<CompatibilityIssue> {
    IssueKind::ordered()
        .into_iter()
        .filter_map(|kind| check(kind, build))
        .collect()
}

/// Run a single rule family against the build.
pub fn check(kind: IssueKind, build: &Build) -> Option<CompatibilityIssue> {
    match kind {
        IssueKind::Socket => check_socket(build),
        IssueKind::FormFactor => check_form_factor(build),
        IssueKind::Power => check_power(build),
    }
}

fn check_socket(build: &Build) -> Option<CompatibilityIssue> {
    let cpu = build.get(ComponentType::Cpu)?;
    let board = build.get(ComponentType::Motherboard)?;
    let (Some(cpu_socket), Some(board_socket)) = (cpu.socket(), board.socket()) else {
        debug!(cpu = %cpu.id, motherboard = %board.id, "socket check skipped: socket unknown");
        return None;
    };

    if sockets_compatible(cpu_socket, board_socket) {
        return None;
    }

    Some(CompatibilityIssue {
        kind: IssueKind::Socket,
        slots: vec![ComponentType::Cpu, ComponentType::Motherboard],
        message: format!(
            "CPU {} uses socket {} but motherboard {} has socket {}",
            cpu.name, cpu_socket, board.name, board_socket
        ),
    })
}

fn check_form_factor(build: &Build) -> Option<CompatibilityIssue> {
    let case = build.get(ComponentType::Case)?;
    let board = build.get(ComponentType::Motherboard)?;
    if case_fits_board(case, board)? {
        return None;
    }

    Some(CompatibilityIssue {
        kind: IssueKind::FormFactor,
        slots: vec![ComponentType::Motherboard, ComponentType::Case],
        message: format!(
            "{} case {} cannot hold the {} motherboard {}",
            case.form_factor()?,
            case.name,
            board.form_factor()?,
            board.name
        ),
    })
}

/// `None` when either form factor is missing or unrecognised.
pub(super) fn case_fits_board(case: &Component, board: &Component) -> Option<bool> {
    let case_ff = case.form_factor().filter(|ff| ff.is_known());
    let board_ff = board.form_factor().filter(|ff| ff.is_known());
    match (case_ff, board_ff) {
        (Some(case_ff), Some(board_ff)) => Some(case_ff.accepts(&board_ff)),
        _ => {
            debug!(case = %case.id, motherboard = %board.id, "form factor check skipped");
            None
        }
    }
}

fn check_power(build: &Build) -> Option<CompatibilityIssue> {
    let psu = build.get(ComponentType::Psu)?;
    let required = required_psu_watts(build)?;
    let Some(available) = psu.wattage() else {
        debug!(psu = %psu.id, "power check skipped: wattage unknown");
        return None;
    };

    if available >= required {
        return None;
    }

    Some(CompatibilityIssue {
        kind: IssueKind::Power,
        slots: vec![ComponentType::Gpu, ComponentType::Psu],
        message: format!(
            "PSU {} provides {:.0}W but the build needs at least {:.0}W",
            psu.name, available, required
        ),
    })
}

/// GPU board power, estimated from VRAM when the catalog gives no figure.
pub fn estimated_gpu_watts(gpu: &Component) -> Option<f64> {
    gpu.recommended_wattage()
        .or_else(|| {
            gpu.memory_gb()
                .map(|memory| GPU_BASE_WATTS + GPU_WATTS_PER_GB * memory)
        })
}

/// Minimum PSU wattage with headroom. Needs a GPU with a known or estimable draw.
pub fn required_psu_watts(build: &Build) -> Option<f64> {
    let gpu = build.get(ComponentType::Gpu)?;
    let gpu_watts = estimated_gpu_watts(gpu)?;
    let cpu_watts = if build.get(ComponentType::Cpu).is_some() {
        CPU_WATTS
    } else {
        0.0
    };
    Some(HEADROOM_FACTOR * (gpu_watts + BASE_SYSTEM_WATTS + cpu_watts))
}
