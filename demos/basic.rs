use std::sync::Arc;

use env_matcher::{
    environment::{EnvironmentDefinition, StaticCapabilities},
    CorpusTrainer, DataObject, EnvironmentRegistry, Recommender, Scheme, ScoringConfig,
};

fn main() -> env_matcher::Result<()> {
    env_logger::init();

    // train on a tiny corpus
    let mut trainer = CorpusTrainer::new();
    trainer.add_object(
        &DataObject::new("thesis", Scheme::Pronom)
            .with_file("text/thesis.doc", &["fmt/40"])
            .with_file("text/figures.xls", &["fmt/61"])
            .with_file("scan.pdf", &["fmt/18"]),
    );
    trainer.add_object(
        &DataObject::new("letters", Scheme::Pronom)
            .with_file("1.doc", &["fmt/40"])
            .with_file("2.doc", &["fmt/40"]),
    );
    let model = Arc::new(trainer.finish()?);

    // environments from program capabilities
    let mut caps = StaticCapabilities::new();
    caps.insert("Q11261", Scheme::Pronom, ["fmt/40", "fmt/61"]);
    caps.insert("Q207006", Scheme::Pronom, ["fmt/18"]);
    let mut registry = EnvironmentRegistry::new();
    registry.add_definition(
        &EnvironmentDefinition { name: "Office 97".into(), programs: vec!["Q11261".into()] },
        &caps,
    )?;
    registry.add_definition(
        &EnvironmentDefinition { name: "Acrobat Reader 5".into(), programs: vec!["Q207006".into()] },
        &caps,
    )?;

    // rank a new object
    let recommender = Recommender::new(model, registry, &ScoringConfig::default())?;
    let object = DataObject::new("report", Scheme::Pronom)
        .with_file("report.doc", &["fmt/40"])
        .with_file("budget.xls", &["fmt/61"])
        .with_file("blob.bin", &["UNKNOWN"]);
    let result = recommender.rank_object(&object)?;

    println!("Ranking: \n{:#?}", result.best());
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
