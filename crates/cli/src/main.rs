// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use zube_config::{BenchAssertion, BenchLimits, BenchScript, ChipDescriptor, Level, StopReason};
use zube_core::bench::{ping_sequence, ExchangeOutcome, Testbench};
use zube_core::bus::SystemBus;
use zube_core::config::SimulationConfig;
use zube_core::metrics::BusMetrics;
use zube_core::signals::DigitalLevel;
use zube_core::soc::Soc;
use zube_core::SimulationError;

mod vcd_trace;

const EXIT_PASS: u8 = 0;
const EXIT_ASSERT_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const RESULT_SCHEMA_VERSION: &str = "1.0";

#[derive(Parser, Debug)]
#[command(author, version, about = "Zube Z80 bridge bench", long_about = None)]
struct Cli {
    /// Enable register-level tracing
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bring the bridge up and ping it from the Z80 side.
    Run(RunArgs),

    /// Deterministic, CI-friendly runner mode driven by a bench script (YAML).
    Test(TestArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Number of exchanges; exchange i sends i to data and i+1 to control
    #[arg(long, default_value = "10")]
    pings: u32,

    /// Chip descriptor (YAML). The built-in Caravel map when omitted.
    #[arg(long)]
    chip: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct TestArgs {
    /// Path to the bench script (YAML)
    #[arg(short = 'c', long)]
    script: PathBuf,

    /// Directory to write test artifacts (result.json)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write the reset line and bridge status as a VCD trace
    #[arg(long)]
    vcd: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct TestResult {
    result_schema_version: String,
    status: String,
    cycles: u64,
    stop_reason: StopReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    limits: BenchLimits,
    base_address: Option<u8>,
    reset_pulse: Vec<Level>,
    exchanges: Vec<ExchangeOutcome>,
    assertions: Vec<AssertionResult>,
    config: TestConfig,
}

#[derive(Debug, Serialize)]
struct AssertionResult {
    assertion: BenchAssertion,
    passed: bool,
}

#[derive(Debug, Serialize)]
struct TestConfig {
    script: PathBuf,
    chip: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level based on --trace flag
    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    match cli.command {
        Commands::Run(args) => run_pings(args),
        Commands::Test(args) => run_test(args),
    }
}

fn run_pings(args: RunArgs) -> ExitCode {
    let config = SimulationConfig::default();
    let soc = match &args.chip {
        Some(path) => {
            let bus = ChipDescriptor::from_file(path)
                .and_then(|chip| SystemBus::from_config(&chip, &config));
            match bus {
                Ok(bus) => Soc::new(bus, config),
                Err(e) => {
                    error!("{:#}", e);
                    return ExitCode::from(EXIT_CONFIG_ERROR);
                }
            }
        }
        None => Soc::caravel(config),
    };

    let metrics = Arc::new(BusMetrics::new());
    let mut bench = Testbench::new(soc);
    bench.soc_mut().add_observer(metrics.clone());

    if let Err(e) = bench.bring_up() {
        error!("Bring-up failed: {}", e);
        return ExitCode::from(EXIT_RUNTIME_ERROR);
    }

    let mut mismatches = 0;
    for exchange in ping_sequence(args.pings) {
        match bench.exchange(exchange) {
            Ok(outcome) if outcome.is_complement() => {
                info!(
                    "ping {:#04x}/{:#04x} -> {:#04x}/{:#04x} ({} polls)",
                    exchange.data,
                    exchange.control,
                    outcome.data_reply.unwrap_or_default(),
                    outcome.control_reply.unwrap_or_default(),
                    outcome.polls
                );
            }
            Ok(outcome) => {
                mismatches += 1;
                error!("Unexpected reply: {:?}", outcome);
            }
            Err(e) => {
                error!("Simulation error: {}", e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        }
    }

    info!(
        pings = args.pings,
        mismatches,
        cycles = bench.soc().cycles(),
        reads = metrics.get_reads(),
        writes = metrics.get_writes(),
        "ping run finished"
    );

    if mismatches > 0 {
        ExitCode::from(EXIT_ASSERT_FAIL)
    } else {
        ExitCode::from(EXIT_PASS)
    }
}

fn stop_reason_for(e: &SimulationError) -> StopReason {
    match e {
        SimulationError::MemoryViolation(_) => StopReason::MemoryViolation,
        SimulationError::BusFloating(_) => StopReason::BusFloating,
        SimulationError::PadMisconfigured { .. } => StopReason::PadMisconfigured,
        SimulationError::BridgeInactive => StopReason::BridgeInactive,
        SimulationError::CycleLimit(_) => StopReason::MaxCycles,
    }
}

fn to_level(level: Option<DigitalLevel>) -> Level {
    match level {
        Some(DigitalLevel::High) => Level::High,
        Some(DigitalLevel::Low) => Level::Low,
        None => Level::Floating,
    }
}

fn run_test(args: TestArgs) -> ExitCode {
    let script = match BenchScript::from_file(&args.script) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("{:#}", e);
            error!("{}", msg);
            write_config_error_outputs(&args, None, msg);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    let chip_path = script.chip_path(&args.script);

    let mut bench = match Testbench::from_script(&script, &args.script) {
        Ok(b) => b,
        Err(e) => {
            let msg = format!("{:#}", e);
            error!("{}", msg);
            write_config_error_outputs(&args, Some(&script.limits), msg);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let mut stop_reason = StopReason::Completed;
    let mut sim_error_happened = false;
    let mut message = None;
    let mut outcomes = Vec::new();

    let run = bench.bring_up().and_then(|()| {
        for &exchange in &script.exchanges {
            let outcome = bench.exchange(exchange)?;
            let answered = outcome.answered();
            outcomes.push(outcome);
            if !answered {
                stop_reason = StopReason::NoReply;
                break;
            }
        }
        Ok(())
    });
    if let Err(e) = run {
        stop_reason = stop_reason_for(&e);
        sim_error_happened = !matches!(e, SimulationError::CycleLimit(_));
        error!("Simulation error: {}", e);
        message = Some(e.to_string());
    }

    let reset_pulse: Vec<Level> = bench
        .reset_trace()
        .map(|t| t.changes().iter().map(|&(_, l)| to_level(l)).collect())
        .unwrap_or_default();
    let base_address = bench.base_address();
    let echoed = outcomes.len() == script.exchanges.len()
        && outcomes.iter().all(ExchangeOutcome::is_complement);

    let mut assertion_results = Vec::new();
    let mut all_passed = true;
    let mut expected_stop_reason_matched = false;

    for assertion in &script.assertions {
        let passed = match assertion {
            BenchAssertion::EchoComplement(a) => a.echo_complement == echoed,
            BenchAssertion::ResetPulse(a) => a.reset_pulse == reset_pulse,
            BenchAssertion::BaseAddress(a) => base_address == Some(a.base_address),
            BenchAssertion::ExpectedStopReason(a) => a.expected_stop_reason == stop_reason,
        };

        if matches!(assertion, BenchAssertion::ExpectedStopReason(_)) && passed {
            expected_stop_reason_matched = true;
        }

        if !passed {
            all_passed = false;
            error!("Assertion failed: {:?}", assertion);
        }

        assertion_results.push(AssertionResult {
            assertion: assertion.clone(),
            passed,
        });
    }

    let mut vcd_failed = false;
    if let Some(vcd_path) = &args.vcd {
        if let Err(e) = vcd_trace::write_vcd(vcd_path, bench.soc()) {
            let msg = format!("Failed to write VCD: {:#}", e);
            error!("{}", msg);
            message.get_or_insert(msg);
            vcd_failed = true;
        }
    }

    let stop_requires_assertion =
        matches!(stop_reason, StopReason::NoReply | StopReason::MaxCycles);

    let (status, code) = if !all_passed || (stop_requires_assertion && !expected_stop_reason_matched)
    {
        ("fail", EXIT_ASSERT_FAIL)
    } else if vcd_failed || (sim_error_happened && !expected_stop_reason_matched) {
        ("error", EXIT_RUNTIME_ERROR)
    } else {
        ("pass", EXIT_PASS)
    };

    let result = TestResult {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        cycles: bench.soc().cycles(),
        stop_reason,
        message,
        limits: script.limits.clone(),
        base_address,
        reset_pulse,
        exchanges: outcomes,
        assertions: assertion_results,
        config: TestConfig {
            script: args.script.clone(),
            chip: chip_path,
        },
    };
    write_outputs(&args, &result);
    info!("Bench {}: {:?}", status, result.stop_reason);

    ExitCode::from(code)
}

fn write_outputs(args: &TestArgs, result: &TestResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize result: {}", e),
    }

    let Some(output_dir) = &args.output_dir else {
        return;
    };
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        error!("Failed to create output directory {:?}: {}", output_dir, e);
        return;
    }
    let result_path = output_dir.join("result.json");
    match std::fs::File::create(&result_path) {
        Ok(f) => {
            if let Err(e) = serde_json::to_writer_pretty(f, result) {
                error!("Failed to write result.json: {}", e);
            }
        }
        Err(e) => error!("Failed to create result.json: {}", e),
    }
}

fn write_config_error_outputs(args: &TestArgs, limits: Option<&BenchLimits>, message: String) {
    let result = TestResult {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        status: "error".to_string(),
        cycles: 0,
        stop_reason: StopReason::ConfigError,
        message: Some(message),
        limits: limits.cloned().unwrap_or_default(),
        base_address: None,
        reset_pulse: Vec::new(),
        exchanges: Vec::new(),
        assertions: Vec::new(),
        config: TestConfig {
            script: args.script.clone(),
            chip: None,
        },
    };
    write_outputs(args, &result);
}
