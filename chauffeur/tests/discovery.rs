use chauffeur::prelude::*;

#[derive(Injectable, Describe)]
#[deliverable(name = "status", alias = "st", discover)]
struct Status;

impl Deliverable for Status {
    fn run(&mut self, _command: &str, _args: &[String]) -> DeliverableResponse {
        DeliverableResponse::Continue
    }
}

#[derive(Injectable, Describe)]
#[deliverable(name = "unknown", discover)]
struct Unknown;

impl Deliverable for Unknown {
    fn run(&mut self, _command: &str, _args: &[String]) -> DeliverableResponse {
        DeliverableResponse::FinishedWithError
    }
}

// Not submitted: only reachable through an explicit catalog.
#[derive(Injectable, Describe)]
#[deliverable(name = "hidden")]
struct Hidden;

impl Deliverable for Hidden {
    fn run(&mut self, _command: &str, _args: &[String]) -> DeliverableResponse {
        DeliverableResponse::Continue
    }
}

#[test]
fn discover_collects_submitted_deliverables() {
    let catalog = Catalog::discover();

    let mut names: Vec<&str> = catalog
        .entries()
        .iter()
        .filter_map(|entry| entry.descriptor().name())
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["status", "unknown"]);
}

#[test]
fn discovered_catalog_bootstraps() {
    let container = Container::bootstrap(&Catalog::discover(), &[]).unwrap();

    let mut status = container.resolve_command_by_name("st").unwrap();
    assert_eq!(status.run("st", &[]), DeliverableResponse::Continue);

    let mut fallback = container.resolve_command_by_name("hidden").unwrap();
    assert_eq!(fallback.run("hidden", &[]), DeliverableResponse::FinishedWithError);
}

#[test]
fn explicit_entries_extend_discovery() {
    let mut catalog = Catalog::discover();
    catalog.push(CatalogEntry::of::<Hidden>());
    let container = Container::bootstrap(&catalog, &[]).unwrap();

    assert_eq!(container.deliverables().len(), 3);
    assert_eq!(container.suggest("statsu"), vec!["status".to_string()]);
}
