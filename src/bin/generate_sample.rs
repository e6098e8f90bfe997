use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

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

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

const PRODUCTS: [(&str, f64); 5] = [
    ("Laptop", 1150.0),
    ("Monitor", 240.0),
    ("Keyboard", 45.0),
    ("Headset", 85.0),
    ("Docking Station", 190.0),
];
const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
const CHANNELS: [&str; 3] = ["Online", "Retail", "Partner"];

/// Write a demo sales workbook for the dashboard.
#[derive(Debug, Parser)]
#[command(name = "generate_sample", about = "Write a demo sales workbook")]
struct Args {
    /// Output workbook.
    #[arg(default_value = "data.xlsx")]
    output: PathBuf,

    /// PRNG seed; the same seed always yields the same workbook.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let money_format = Format::new().set_num_format("#,##0.00");
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Sales")?;
    // Untidy header spellings, as exported by hand-maintained sheets.
    for (col, title) in ["Date", "Product", " Region ", "Units", "Unit Price", "Channel"]
        .iter()
        .enumerate()
    {
        sheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }

    let mut row: u32 = 1;
    for month in 1u8..=3 {
        for day in 1u8..=28 {
            let date = ExcelDateTime::from_ymd(2024, month, day)
                .with_context(|| format!("building date 2024-{month:02}-{day:02}"))?;
            let orders = 2 + rng.next_u64() % 4;
            for _ in 0..orders {
                let (product, list_price) = *rng.pick(&PRODUCTS);
                let discount = 0.85 + 0.15 * rng.next_f64();
                let units = 1 + rng.next_u64() % 12;

                sheet.write_datetime_with_format(row, 0, &date, &date_format)?;
                sheet.write_string(row, 1, product)?;
                sheet.write_string(row, 2, *rng.pick(&REGIONS))?;
                sheet.write_number(row, 3, units as f64)?;
                sheet.write_number_with_format(
                    row,
                    4,
                    (list_price * discount * 100.0).round() / 100.0,
                    &money_format,
                )?;
                sheet.write_string(row, 5, *rng.pick(&CHANNELS))?;
                row += 1;
            }
        }
    }

    // A few rows the normalizer is expected to drop.
    sheet.write_string(row, 0, "not a date")?;
    sheet.write_string(row, 1, "Laptop")?;
    sheet.write_string(row, 2, "North")?;
    sheet.write_number(row, 3, 1.0)?;
    sheet.write_number(row, 4, 999.0)?;
    row += 1;

    let date = ExcelDateTime::from_ymd(2024, 2, 14)?;
    sheet.write_datetime_with_format(row, 0, &date, &date_format)?;
    sheet.write_string(row, 1, "Monitor")?;
    sheet.write_number(row, 3, 2.0)?;
    sheet.write_number(row, 4, 240.0)?;
    row += 1;

    sheet.write_datetime_with_format(row, 0, &date, &date_format)?;
    sheet.write_string(row, 1, "Keyboard")?;
    sheet.write_string(row, 2, "East")?;
    sheet.write_string(row, 3, "a few")?;
    sheet.write_number(row, 4, 45.0)?;
    row += 1;

    sheet.autofit();
    workbook
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!("Wrote {} sales rows to {}", row - 1, args.output.display());
    Ok(())
}
