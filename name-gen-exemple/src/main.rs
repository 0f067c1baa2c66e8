use name_gen_core::{CorpusConfig, NameModel, PredictionInput, StartSeed};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows corpus statistics and seed retries
    env_logger::init();

    // Load the model built from "data/pokemon.dat"
    // Load automatically "data/pokemon.bin" if existing, build and save it otherwise
    let config = CorpusConfig::default();
    let model = NameModel::new("./data/pokemon.dat", &config)?;
    log::info!(
        "{} names, alphabet of {} symbols, lengths {}..={}",
        model.corpus().names().len(),
        model.corpus().alphabet().len(),
        model.corpus().min_len(),
        model.corpus().max_len()
    );

    // Training tensors for an external trainer
    let dataset = model.training_data();
    println!("Training examples: {} (window shape {:?})", dataset.len(), dataset.windows.shape());

    // Default input: random seed from the bigram table, temperature 0.3
    let mut input = PredictionInput::default();

    // Number of retries if the generated name is already in the corpus
    input.nb_try = 100;

    // Generated names are capped to the longest corpus name unless set
    input.max_length = None;

    // Temperature must be between 0.0 and 1.0
    match input.set_temperature(2.0) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("{e}"),
    }

    for i in 0..10 {
        println!("Generated name {}: {}", i + 1, model.generate(&input)?);
    }

    // Custom seed: exactly `seq_len` characters, raw sampling temperature
    input.start_seed = StartSeed::Custom("char".to_owned());
    input.set_temperature(1.0)?;
    for i in 0..5 {
        println!("Seeded name {}: {}", i + 1, model.generate(&input)?);
    }

    // Greedy decoding is deterministic
    input.set_temperature(0.0)?;
    println!("Greedy from 'char': {}", model.generate(&input)?);

    Ok(())
}
