use ldap_predicate::strategy::{DefaultApproximate, Locale};
use ldap_predicate::{FilterCompiler, impl_record, options};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

// Tests in this file share the process-wide options
static GLOBAL_OPTIONS: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    let guard = GLOBAL_OPTIONS
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    options::reset();
    guard
}

#[derive(Debug, Default)]
struct Account {
    sn: Option<String>,
}

impl_record!(Account { "Sn" => sn });

fn account(sn: &str) -> Account {
    Account {
        sn: Some(sn.to_string()),
    }
}

#[test]
fn test_defaults_use_builtin_strategies() {
    let _guard = lock();
    let current = options::current();

    assert!(
        current
            .like_descriptor()
            .function
            .ends_with("DefaultLike::is_like")
    );
    assert!(
        current
            .approximate_descriptor()
            .function
            .ends_with("DefaultApproximate::encode")
    );
    assert!(!current.is_case_insensitive_store());
}

#[test]
fn test_add_namespaces_keeps_defaults() {
    let _guard = lock();
    options::configure(|o| o.add_namespaces(["store::functions"]));

    assert_eq!(
        options::current().namespaces(),
        ["ldap_predicate::strategy", "store::functions"]
    );
}

#[test]
fn test_case_insensitive_store_flag_reaches_compiled_predicates() {
    let _guard = lock();
    let folded = FilterCompiler::new().compile::<Account>("(sn=doe)").unwrap();

    options::configure(|o| o.case_insensitive_store());
    assert!(options::current().is_case_insensitive_store());
    let raw = FilterCompiler::new().compile::<Account>("(sn=doe)").unwrap();

    assert!(folded.evaluate(&account("DOE")).unwrap());
    assert!(!raw.evaluate(&account("DOE")).unwrap());
    assert!(raw.evaluate(&account("doe")).unwrap());
    assert_eq!(raw.render(), "m.Sn == \"doe\"");
}

#[test]
fn test_reset_restores_defaults() {
    let _guard = lock();
    options::configure(|o| o.case_insensitive_store().add_namespaces(["x"]));
    options::reset();

    let current = options::current();
    assert!(!current.is_case_insensitive_store());
    assert_eq!(current.namespaces(), ["ldap_predicate::strategy"]);
}

#[test]
fn test_compiled_predicate_keeps_its_snapshot() {
    let _guard = lock();
    options::configure(|o| o.with_approximate(DefaultApproximate::new(Locale::Default)));
    let predicate = FilterCompiler::new().compile::<Account>("(sn~=bg)").unwrap();

    // "Bs" codes B200 in English and B800 in French
    options::configure(|o| o.with_approximate(DefaultApproximate::new(Locale::French)));
    assert!(predicate.evaluate(&account("bs")).unwrap());

    let french = FilterCompiler::new().compile::<Account>("(sn~=bg)").unwrap();
    assert!(!french.evaluate(&account("bs")).unwrap());
}

#[test]
fn test_concurrent_readers_see_whole_snapshots() {
    let _guard = lock();

    let writer = thread::spawn(|| {
        for i in 0..200 {
            if i % 2 == 0 {
                options::configure(|o| o.case_insensitive_store().add_namespaces(["store::ci"]));
            } else {
                options::reset();
            }
        }
    });

    let readers: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                for _ in 0..200 {
                    let snapshot: Arc<_> = options::current();
                    let has_namespace = snapshot.namespaces().iter().any(|n| n == "store::ci");
                    assert_eq!(snapshot.is_case_insensitive_store(), has_namespace);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    options::reset();
}
