use std::time::Duration;

use futures::StreamExt;
use headway::{Effect, Reducer, Store};

#[derive(Clone, Debug, PartialEq)]
struct Ledger {
    entries: Vec<(usize, u32)>,
}

#[derive(Clone)]
enum LedgerAction {
    Append(usize, u32),
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatch_is_serialized() {
    let reducer = Reducer::new(
        |state: &mut Ledger, LedgerAction::Append(sender, seq), _env: &()| {
            state.entries.push((sender, seq));
            vec![]
        },
    );
    let store = Store::new(Ledger { entries: vec![] }, reducer, ());
    let mut updates = store.updates();

    let mut tasks = Vec::new();
    for sender in 0..8usize {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            for seq in 0..50u32 {
                store.send(LedgerAction::Append(sender, seq));
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let final_state = loop {
        let state = updates.next().await.unwrap();
        if state.entries.len() == 8 * 50 {
            break state;
        }
    };
    // Dispatches interleave across senders, but each sender's own order
    // survives, and no entry is lost or duplicated.
    for sender in 0..8usize {
        let seqs: Vec<u32> = final_state
            .entries
            .iter()
            .filter(|(s, _)| *s == sender)
            .map(|(_, seq)| *seq)
            .collect();
        assert_eq!(seqs, (0..50).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn test_effect_cascade_terminates_in_order() {
    // Each action n schedules an effect dispatching n - 1, down to zero.
    let reducer = Reducer::new(|state: &mut Vec<i32>, n: i32, _env: &()| {
        state.push(n);
        if n > 0 {
            vec![Effect::value(n - 1)]
        } else {
            vec![]
        }
    });
    let store = Store::new(Vec::new(), reducer, ());
    let mut updates = store.updates();

    store.send(3);
    loop {
        let state = updates.next().await.unwrap();
        if state.len() == 4 {
            assert_eq!(state, vec![3, 2, 1, 0]);
            break;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_timed_effect_delivers_after_delay() {
    let reducer = Reducer::new(
        |state: &mut Vec<&'static str>, action: &'static str, _env: &()| {
            state.push(action);
            if action == "start" {
                vec![Effect::deferred(async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "done"
                })]
            } else {
                vec![]
            }
        },
    );
    let store = Store::new(Vec::new(), reducer, ());
    let mut updates = store.updates();

    store.send("start");
    loop {
        let state = updates.next().await.unwrap();
        if state == vec!["start", "done"] {
            break;
        }
    }
}

#[tokio::test]
async fn test_projection_chain_stays_consistent() {
    #[derive(Clone)]
    struct App {
        count: i64,
        tag: &'static str,
    }

    let reducer = Reducer::new(|state: &mut App, add: i64, _env: &()| {
        state.count += add;
        vec![]
    });
    let store = Store::new(
        App {
            count: 0,
            tag: "app",
        },
        reducer,
        (),
    );
    let counter = store.projection(|app: App| app.count, |n: i64| n);
    let sign = counter.projection(|count: i64| count.signum(), |n: i64| n);

    let mut signs = sign.updates();
    assert_eq!(signs.next().await, Some(0));

    sign.send(-4);
    assert_eq!(signs.next().await, Some(-1));
    assert_eq!(counter.value(), -4);
    assert_eq!(store.value().count, -4);
    assert_eq!(store.value().tag, "app");
}

#[tokio::test]
async fn test_pulled_back_reducers_drive_global_store() {
    #[derive(Clone, Debug, PartialEq)]
    struct App {
        count: i64,
        log: Vec<&'static str>,
    }

    #[derive(Clone)]
    enum AppAction {
        Counter(i64),
        Note(&'static str),
    }

    let counter = Reducer::new(|count: &mut i64, add: i64, _env: &()| {
        *count += add;
        vec![]
    })
    .pull_back(
        |app: &mut App| &mut app.count,
        |action: &AppAction| match action {
            AppAction::Counter(n) => Some(*n),
            _ => None,
        },
        AppAction::Counter,
        |_env: &()| (),
    );
    let notes = Reducer::new(|app: &mut App, action: AppAction, _env: &()| {
        if let AppAction::Note(note) = action {
            app.log.push(note);
        }
        vec![]
    });
    let reducer = Reducer::combine([counter, notes]);

    let store = Store::new(
        App {
            count: 0,
            log: vec![],
        },
        reducer,
        (),
    );
    let mut updates = store.updates();
    updates.next().await;

    store.send(AppAction::Counter(2));
    updates.next().await;
    store.send(AppAction::Note("checked"));
    let state = updates.next().await.unwrap();
    assert_eq!(state.count, 2);
    assert_eq!(state.log, vec!["checked"]);
}
