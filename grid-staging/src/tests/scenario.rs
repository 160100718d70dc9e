use crate::config::EngineConfig;
use crate::controller::EditSession;
use crate::identity::{Identity, ServerId};
use crate::planner::CommitPlanner;
use crate::row::RowStatus;
use crate::testing::InMemoryRemote;
use crate::tests::fixtures::Item;
use crate::util::errors::StagingError;
use crate::validation::{ViolationKind, ONLY_ONE_REPRESENTATIVE};

// Group G001 holds R106 (representative) and R107. A third row R108 is added
// as representative without clearing R106 first.
#[tokio::test]
async fn second_representative_blocks_commit_until_resolved() {
    let remote = InMemoryRemote::<Item>::new("S");
    remote.seed(vec![
        (ServerId::new("S1"), Item::new("G001", "R106", true, 1)),
        (ServerId::new("S2"), Item::new("G001", "R107", false, 2)),
    ]);
    let mut session = EditSession::new("positions", remote, EngineConfig::default());
    session.load().await.unwrap();
    let r106 = Identity::Server(ServerId::new("S1"));
    let r107 = Identity::Server(ServerId::new("S2"));

    let r108 = session.add_row(Some("G001".into()), Item::new("", "R108", true, 0));
    assert_eq!(session.collection().get(&r108).unwrap().payload().sequence, 3);

    let result = session.validate();
    let report = result.report().expect("two representatives");
    let flagged: Vec<&Identity> = report
        .of_kind(ViolationKind::MultipleRepresentatives)
        .map(|violation| &violation.identity)
        .collect();
    assert_eq!(flagged, vec![&r106, &r108]);
    assert!(report.violations().iter().all(|v| v.message == ONLY_ONE_REPRESENTATIVE));

    session.remote().clear_calls();
    assert!(matches!(session.commit().await, Err(StagingError::Validation(_))));
    assert!(session.remote().calls().is_empty());

    session.update(&r106, |item| item.representative = false).unwrap();
    assert!(session.validate().is_valid());

    let batch = CommitPlanner::default().plan(session.collection()).unwrap();
    assert_eq!(batch.count("create"), 1);
    assert_eq!(batch.count("update"), 1);
    assert!(batch.iter().all(|planned| planned.op.row() != r107));

    let outcome = session.commit().await.unwrap();
    assert!(outcome.is_success());

    let rows = session.collection().rows();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.status() == RowStatus::Clean && !row.identity().is_temp()));
    let representatives: Vec<&str> = rows
        .iter()
        .filter(|row| row.payload().representative)
        .map(|row| row.payload().code.as_str())
        .collect();
    assert_eq!(representatives, vec!["R108"]);
}
