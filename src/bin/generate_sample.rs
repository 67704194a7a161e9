use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let names = ["Ada", "Grace", "Linus", "Ken", "Barbara", "Edsger", "Margaret"];
    let cities = ["Rome", "Oslo", "Lima", "Kyoto", "Austin"];
    let n_rows: i64 = 200;

    let mut all_id = Vec::new();
    let mut all_name = Vec::new();
    let mut all_age = Vec::new();
    let mut all_city = Vec::new();
    let mut all_score = Vec::new();
    let mut all_active = Vec::new();

    for id in 0..n_rows {
        all_id.push(id);
        all_name.push(rng.pick(&names));
        all_age.push(18 + (rng.next_u64() % 60) as i64);
        all_city.push(rng.pick(&cities));
        all_score.push((rng.next_f64() * 1000.0).round() / 10.0);
        all_active.push(rng.next_f64() < 0.7);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("age", DataType::Int64, false),
        Field::new("city", DataType::Utf8, false),
        Field::new("score", DataType::Float64, false),
        Field::new("active", DataType::Boolean, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(all_id)),
            Arc::new(StringArray::from(all_name)),
            Arc::new(Int64Array::from(all_age)),
            Arc::new(StringArray::from(all_city)),
            Arc::new(Float64Array::from(all_score)),
            Arc::new(BooleanArray::from(all_active)),
        ],
    )
    .context("building record batch")?;

    let output_path = "sample_data.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    println!("Wrote {n_rows} records to {output_path}");
    Ok(())
}
