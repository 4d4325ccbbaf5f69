//! Compilation scheduler tests
//!
//! Uses instrumented compilers to observe concurrency, skipping and the
//! failure policy without a real toolchain.

use multineat_build::{
    BuildContext, BuildTarget, CompilationJob, Compiler, JobOutcome, JobTable, OsFamily,
    PlatformProfile, Scheduler,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Tracks how many compilations run at once
#[derive(Default)]
struct ConcurrencyProbe {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl Compiler for ConcurrencyProbe {
    fn compile(&self, _job: &CompilationJob) -> Result<(), String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(15));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn pregenerated_target() -> BuildTarget {
    let ctx = BuildContext::new("/project", OsFamily::Posix).with_pregenerated(true);
    let resolution = multineat_build::resolve(&ctx).unwrap();
    BuildTarget::assemble(&resolution, &PlatformProfile::build(OsFamily::Posix, None))
}

fn table_for(sources: &[PathBuf]) -> JobTable {
    let mut table = JobTable::new();
    for source in sources {
        table.insert(CompilationJob {
            source: source.clone(),
            input: source.clone(),
            object: source.with_extension("o"),
            flags: Vec::new(),
        });
    }
    table
}

#[test]
fn test_concurrency_never_exceeds_pool_size() {
    let sources: Vec<PathBuf> = (0..24)
        .map(|i| PathBuf::from(format!("src/unit{i}.cpp")))
        .collect();
    let table = table_for(&sources);

    for workers in [1, 2, 4] {
        let probe = ConcurrencyProbe::default();
        let report = Scheduler::new(workers).run(&sources, &table, &probe).unwrap();

        assert!(
            probe.peak.load(Ordering::SeqCst) <= workers,
            "peak {} exceeded pool size {}",
            probe.peak.load(Ordering::SeqCst),
            workers
        );
        assert_eq!(probe.total.load(Ordering::SeqCst), sources.len());
        assert_eq!(report.compiled_count(), sources.len());
    }
}

#[test]
fn test_report_aligned_with_sources() {
    let target = pregenerated_target();
    let table = JobTable::plan(&target, Path::new("/project"), Path::new("/project/build"));
    let probe = ConcurrencyProbe::default();

    let report = Scheduler::new(3).run(&target.sources, &table, &probe).unwrap();

    assert_eq!(report.outcomes.len(), target.sources.len());
    for (source, object) in target.sources.iter().zip(report.object_paths()) {
        let expected = Path::new("/project/build").join(source.with_extension("o"));
        assert_eq!(object, Some(expected));
    }
}

#[test]
fn test_unknown_sources_are_skipped_not_failed() {
    let known: Vec<PathBuf> = vec![PathBuf::from("a.cpp"), PathBuf::from("b.cpp")];
    let table = table_for(&known);
    let sources = vec![
        PathBuf::from("a.cpp"),
        PathBuf::from("extra.cpp"),
        PathBuf::from("b.cpp"),
    ];
    let probe = ConcurrencyProbe::default();

    let report = Scheduler::new(2).run(&sources, &table, &probe).unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.outcomes[1], JobOutcome::Skipped);
    assert!(report.outcomes[0].is_compiled());
    assert!(report.outcomes[2].is_compiled());
    assert!(report.is_success());
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(probe.total.load(Ordering::SeqCst), 2);

    let compiled: Vec<&Path> = report.compiled_objects().iter().map(|(s, _)| *s).collect();
    assert_eq!(compiled, vec![Path::new("a.cpp"), Path::new("b.cpp")]);
}

/// Fails one source after a delay; every other job sleeps briefly
struct FailingCompiler {
    fail_on: PathBuf,
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl Compiler for FailingCompiler {
    fn compile(&self, job: &CompilationJob) -> Result<(), String> {
        self.started.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        self.finished.fetch_add(1, Ordering::SeqCst);
        if job.source == self.fail_on {
            Err("undefined reference".to_string())
        } else {
            Ok(())
        }
    }
}

#[test]
fn test_failure_halts_scheduling_but_drains_in_flight() {
    let sources: Vec<PathBuf> = (0..16)
        .map(|i| PathBuf::from(format!("src/unit{i}.cpp")))
        .collect();
    let table = table_for(&sources);
    let compiler = FailingCompiler {
        fail_on: sources[0].clone(),
        started: AtomicUsize::new(0),
        finished: AtomicUsize::new(0),
    };

    let report = Scheduler::new(2).run(&sources, &table, &compiler).unwrap();

    // Every started job ran to completion
    assert_eq!(
        compiler.started.load(Ordering::SeqCst),
        compiler.finished.load(Ordering::SeqCst)
    );
    assert!(compiler.started.load(Ordering::SeqCst) < sources.len());
    assert!(matches!(report.outcomes[0], JobOutcome::Failed { .. }));
    assert!(report
        .outcomes
        .iter()
        .any(|o| matches!(o, JobOutcome::NotScheduled { .. })));
    assert_eq!(report.outcomes.len(), sources.len());
    assert!(report.into_result().is_err());
}

#[test]
fn test_generated_binding_compiles_generated_source() {
    let ctx = BuildContext::new("/project", OsFamily::Posix)
        .with_strategy_signal(Some("cython".to_string()))
        .with_generator_available(true);
    let resolution = multineat_build::resolve(&ctx).unwrap();
    let target = BuildTarget::assemble(&resolution, &PlatformProfile::build(OsFamily::Posix, None));

    let table = JobTable::plan(&target, Path::new("/project"), Path::new("/project/build"));
    let job = table.get(Path::new("_MultiNEAT.pyx")).unwrap();

    assert_eq!(job.input, PathBuf::from("/project/_MultiNEAT.cpp"));
    assert_eq!(job.object, PathBuf::from("/project/build/_MultiNEAT.o"));
    assert_eq!(table.len(), 11);
}
