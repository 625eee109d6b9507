//! Picks the district the clock counts down for.
//!
//! `set-location <plate>` lists the districts of a province;
//! `set-location <plate> <district>` saves it and downloads its prayer times.

use anyhow::{bail, Context, Result};
use log::info;

use prayer_clock::cache::ScheduleCache;
use prayer_clock::config::{LocationSettings, Place, SettingsStore};
use prayer_clock::diyanet::{District, DiyanetClient};
use prayer_clock::location::{city_by_id, city_by_plate};
use prayer_clock::refresh::{refresh, RefreshOutcome};
use prayer_clock::Settings;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut store = SettingsStore::at_default_location()?;
    let settings = store.load()?;

    let Some(plate) = args.first() else {
        print_current(&settings);
        println!("\nUsage: set-location <plate code> [district name]");
        return Ok(());
    };

    let city = city_by_plate(plate).with_context(|| format!("Unknown plate code {plate:?}"))?;
    let client = DiyanetClient::new(settings.refresh.fetch_timeout())?;
    let districts = client
        .districts(city.id)
        .with_context(|| format!("Failed to fetch districts of {}", city.name))?;

    let wanted = args[1..].join(" ");
    if wanted.is_empty() {
        println!("Districts of {} ({}):", city.name, city.plate);
        for district in &districts {
            println!("  {}", district.name);
        }
        return Ok(());
    }

    let district = find_district(&districts, &wanted)
        .with_context(|| format!("{} has no district named {:?}", city.name, wanted))?;

    let location = LocationSettings {
        city: Place {
            name: city.name.to_string(),
            id: city.id.to_string(),
        },
        district: Place {
            name: district.name.clone(),
            id: district.id.clone(),
        },
    };
    // A running clock notices the change and fetches the new district itself.
    store.update(|settings| settings.location = location)?;
    info!("Saved location {} / {}", district.name, city.name);
    println!("Location set to {} / {}", district.name, city.name);

    let cache = ScheduleCache::at_default_location()?;
    cache.clear()?;
    match refresh(&client, &cache, &district.id) {
        RefreshOutcome::Updated { schedule, .. } => {
            println!("Downloaded {} day(s) of prayer times", schedule.len());
            Ok(())
        }
        RefreshOutcome::Failed { reason } => {
            bail!("Location saved, but downloading prayer times failed: {reason}")
        }
    }
}

fn print_current(settings: &Settings) {
    let location = &settings.location;
    let plate = city_by_id(&location.city.id)
        .map(|city| city.plate)
        .unwrap_or("??");
    println!(
        "Current location: {} / {} (plate {}, district id {})",
        location.district.name, location.city.name, plate, location.district.id
    );
}

/// Case-insensitive match, so "kadıköy" finds "KADIKÖY".
fn find_district<'a>(districts: &'a [District], wanted: &str) -> Option<&'a District> {
    let wanted = fold(wanted);
    districts.iter().find(|district| fold(&district.name) == wanted)
}

fn fold(name: &str) -> String {
    // Turkish dotted/dotless i do not round-trip through to_lowercase
    name.trim()
        .chars()
        .map(|c| match c {
            'I' | 'İ' | 'ı' => 'i',
            other => other.to_lowercase().next().unwrap_or(other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn district(name: &str) -> District {
        District {
            name: name.to_string(),
            id: "1".to_string(),
        }
    }

    #[test]
    fn matches_turkish_names_case_insensitively() {
        let districts = vec![district("KADIKÖY"), district("ŞİLE"), district("ADALAR")];
        assert_eq!(
            find_district(&districts, "kadıköy").map(|d| d.name.as_str()),
            Some("KADIKÖY")
        );
        assert_eq!(
            find_district(&districts, " Şile ").map(|d| d.name.as_str()),
            Some("ŞİLE")
        );
        assert!(find_district(&districts, "beşiktaş").is_none());
    }
}
