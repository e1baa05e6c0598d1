use featurefilter::*;

fn main() -> Result<(), FilterError> {
    // 1. Load the filter configuration
    let config = FilterConfig::from_json_str(
        r#"{"layers": [{"layerId": "parks", "snippets": [
            {"type": "dropdown", "attrName": "district"},
            {"type": "slider", "attrName": "area"}
        ]}]}"#,
    )?;
    let layer = config.layer("parks").ok_or_else(|| FilterError::Config("layer parks missing".to_string()))?;

    // 2. Features delivered by the map layer
    let features: Vec<Feature> = [("Altona", 12.5), ("Eimsbüttel", 3.0), ("Altona", 40.0)]
        .into_iter()
        .map(|(district, area)| FeatureBuilder::new().attr("district", district).attr("area", area).build())
        .collect();

    // 3. Size the snippets from the values present
    let mut acc = AdjustmentAccumulator::new();
    acc.ingest(&layer.snippets, &features, 1, Some(1))?;
    println!("Adjustments: {:#?}", acc.adjustments());

    // 4. Apply the rules the user picked
    let mut rules = RuleSet::new();
    rules.set_rule(Rule::new("district", Operator::Eq, "Altona").with_snippet_id(0));
    rules.set_rule(Rule::new("area", Operator::Ge, 20).with_snippet_id(1));
    for feature in rules.filter(&features) {
        println!("Visible: {:?}", feature.values());
    }
    Ok(())
}
