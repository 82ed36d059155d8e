mod common;

use common::{capture_logs, logged, logged_at};
use kernel_boot::subsystems::{BOOT_ORDER, HOT_SERVICES, MEMORY};
use kernel_boot::{AbortSignal, BootError, ModuleDescriptor, Sequencer, SequencerState, Severity};
use log::Level;
use std::cell::RefCell;

/// Runs five modules named after the boot order. The module at `failing`
/// fails with `severity`, every other module is fatal and succeeds.
/// Returns the result and the names of the initializers that ran.
fn run_with_failure(
    failing: usize,
    severity: Severity,
) -> (Result<Vec<&'static str>, BootError>, Vec<&'static str>) {
    let ran = RefCell::new(Vec::new());
    let mut inits: Vec<_> = (0..BOOT_ORDER.len())
        .map(|i| {
            let ran = &ran;
            move || {
                ran.borrow_mut().push(BOOT_ORDER[i]);
                i != failing
            }
        })
        .collect();

    let mut modules: Vec<ModuleDescriptor<'_>> = inits
        .iter_mut()
        .enumerate()
        .map(|(i, init)| {
            let module_severity = if i == failing {
                severity
            } else {
                Severity::Fatal(AbortSignal::DeviceError)
            };
            ModuleDescriptor::new(BOOT_ORDER[i], module_severity, init)
        })
        .collect();

    let result = Sequencer::new().run(&mut modules).map(|report| report.ready);
    let ran = ran.borrow().clone();
    (result, ran)
}

#[test]
fn fatal_failure_stops_every_later_initializer() {
    for failing in 0..BOOT_ORDER.len() {
        let (result, ran) = run_with_failure(failing, Severity::Fatal(AbortSignal::DeviceError));

        assert_eq!(ran, BOOT_ORDER[..=failing], "failing module {failing}");
        match result {
            Err(BootError::FatalModule { module, signal }) => {
                assert_eq!(module, BOOT_ORDER[failing]);
                assert_eq!(signal, AbortSignal::DeviceError);
            }
            other => panic!("expected a fatal module error, got {other:?}"),
        }
    }
}

#[test]
fn recoverable_failure_runs_every_later_initializer() {
    for failing in 0..BOOT_ORDER.len() {
        let (result, ran) = run_with_failure(failing, Severity::Recoverable);

        assert_eq!(ran, BOOT_ORDER, "failing module {failing}");
        let ready = result.expect("recoverable failures do not abort");
        assert_eq!(ready.len(), BOOT_ORDER.len() - 1);
        assert!(!ready.contains(&BOOT_ORDER[failing]));
    }
}

#[test]
fn two_recoverable_failures_boot_degraded_with_two_warnings() {
    capture_logs();
    let mut memory = || true;
    let mut devices = || false;
    let mut filesystem = || true;
    let mut graphics = || false;
    let mut hot_services = || true;
    let mut modules = [
        ModuleDescriptor::fatal(MEMORY, AbortSignal::ResourceExhaustion, &mut memory),
        ModuleDescriptor::recoverable("devices", &mut devices),
        ModuleDescriptor::recoverable("filesystem", &mut filesystem),
        ModuleDescriptor::recoverable("graphics", &mut graphics),
        ModuleDescriptor::fatal(HOT_SERVICES, AbortSignal::DeviceError, &mut hot_services),
    ];

    let report = Sequencer::new().run(&mut modules).expect("boot continues");

    assert_eq!(report.ready, [MEMORY, "filesystem", HOT_SERVICES]);
    assert_eq!(report.degraded, ["devices", "graphics"]);

    let warnings = logged_at(Level::Warn);
    let targets: Vec<&str> = warnings.iter().map(|l| l.target.as_str()).collect();
    assert_eq!(targets, ["devices", "graphics"]);
    assert!(logged_at(Level::Error).is_empty());
}

#[test]
fn fatal_memory_failure_reports_once_and_runs_nothing_else() {
    capture_logs();
    let later_ran = RefCell::new(false);
    let mut memory = || false;
    let mut devices = || {
        *later_ran.borrow_mut() = true;
        true
    };
    let mut hot_services = || {
        *later_ran.borrow_mut() = true;
        true
    };
    let mut modules = [
        ModuleDescriptor::fatal(MEMORY, AbortSignal::ResourceExhaustion, &mut memory),
        ModuleDescriptor::recoverable("devices", &mut devices),
        ModuleDescriptor::fatal(HOT_SERVICES, AbortSignal::DeviceError, &mut hot_services),
    ];

    let mut sequencer = Sequencer::new();
    let err = sequencer.run(&mut modules).expect_err("memory is fatal");

    assert_eq!(err.abort_signal(), AbortSignal::ResourceExhaustion);
    assert_eq!(sequencer.state(), SequencerState::AbortedFatal(0));
    assert!(!*later_ran.borrow());

    let errors = logged_at(Level::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].target, MEMORY);

    let memory_lines: Vec<_> = logged().into_iter().filter(|l| l.target == MEMORY).collect();
    assert_eq!(memory_lines.len(), 1, "one line for the failing module: {memory_lines:?}");
    assert!(memory_lines[0].message.contains("initializer reported failure"));
}

#[test]
fn success_is_logged_under_each_module_tag() {
    capture_logs();
    let mut a = || true;
    let mut b = || true;
    let mut modules = [
        ModuleDescriptor::fatal(MEMORY, AbortSignal::ResourceExhaustion, &mut a),
        ModuleDescriptor::recoverable("graphics", &mut b),
    ];

    Sequencer::new().run(&mut modules).expect("all ready");

    let info: Vec<String> = logged_at(Level::Info)
        .into_iter()
        .map(|l| format!("[{}] {}", l.target, l.message))
        .collect();
    assert_eq!(info, ["[memory] ready", "[graphics] ready"]);
}
