use anyhow::Result;

use crate::config::{LocationSettings, Place};
use crate::diyanet::District;

/// A Turkish province as known to the prayer-times site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct City {
    /// Licence-plate code, two digits
    pub plate: &'static str,
    pub name: &'static str,
    pub id: &'static str,
}

pub static CITIES: [City; 81] = [
    City { plate: "01", name: "Adana", id: "500" },
    City { plate: "02", name: "Adıyaman", id: "501" },
    City { plate: "03", name: "Afyon", id: "502" },
    City { plate: "04", name: "Ağrı", id: "503" },
    City { plate: "05", name: "Amasya", id: "505" },
    City { plate: "06", name: "Ankara", id: "506" },
    City { plate: "07", name: "Antalya", id: "507" },
    City { plate: "08", name: "Artvin", id: "509" },
    City { plate: "09", name: "Aydın", id: "510" },
    City { plate: "10", name: "Balıkesir", id: "511" },
    City { plate: "11", name: "Bilecik", id: "515" },
    City { plate: "12", name: "Bingöl", id: "516" },
    City { plate: "13", name: "Bitlis", id: "517" },
    City { plate: "14", name: "Bolu", id: "518" },
    City { plate: "15", name: "Burdur", id: "519" },
    City { plate: "16", name: "Bursa", id: "520" },
    City { plate: "17", name: "Çanakkale", id: "521" },
    City { plate: "18", name: "Çankırı", id: "522" },
    City { plate: "19", name: "Çorum", id: "523" },
    City { plate: "20", name: "Denizli", id: "524" },
    City { plate: "21", name: "Diyarbakır", id: "525" },
    City { plate: "22", name: "Edirne", id: "527" },
    City { plate: "23", name: "Elazığ", id: "528" },
    City { plate: "24", name: "Erzincan", id: "529" },
    City { plate: "25", name: "Erzurum", id: "530" },
    City { plate: "26", name: "Eskişehir", id: "531" },
    City { plate: "27", name: "Gaziantep", id: "532" },
    City { plate: "28", name: "Giresun", id: "533" },
    City { plate: "29", name: "Gümüşhane", id: "534" },
    City { plate: "30", name: "Hakkari", id: "535" },
    City { plate: "31", name: "Hatay", id: "536" },
    City { plate: "32", name: "Isparta", id: "538" },
    City { plate: "33", name: "Mersin", id: "557" },
    City { plate: "34", name: "İstanbul", id: "539" },
    City { plate: "35", name: "İzmir", id: "540" },
    City { plate: "36", name: "Kars", id: "544" },
    City { plate: "37", name: "Kastamonu", id: "545" },
    City { plate: "38", name: "Kayseri", id: "546" },
    City { plate: "39", name: "Kırklareli", id: "549" },
    City { plate: "40", name: "Kırşehir", id: "550" },
    City { plate: "41", name: "Kocaeli", id: "551" },
    City { plate: "42", name: "Konya", id: "552" },
    City { plate: "43", name: "Kütahya", id: "553" },
    City { plate: "44", name: "Malatya", id: "554" },
    City { plate: "45", name: "Manisa", id: "555" },
    City { plate: "46", name: "K.Maraş", id: "541" },
    City { plate: "47", name: "Mardin", id: "556" },
    City { plate: "48", name: "Muğla", id: "558" },
    City { plate: "49", name: "Muş", id: "559" },
    City { plate: "50", name: "Nevşehir", id: "560" },
    City { plate: "51", name: "Niğde", id: "561" },
    City { plate: "52", name: "Ordu", id: "562" },
    City { plate: "53", name: "Rize", id: "564" },
    City { plate: "54", name: "Sakarya", id: "565" },
    City { plate: "55", name: "Samsun", id: "566" },
    City { plate: "56", name: "Siirt", id: "568" },
    City { plate: "57", name: "Sinop", id: "569" },
    City { plate: "58", name: "Sivas", id: "571" },
    City { plate: "59", name: "Tekirdağ", id: "572" },
    City { plate: "60", name: "Tokat", id: "573" },
    City { plate: "61", name: "Trabzon", id: "574" },
    City { plate: "62", name: "Tunceli", id: "575" },
    City { plate: "63", name: "Şanlıurfa", id: "567" },
    City { plate: "64", name: "Uşak", id: "576" },
    City { plate: "65", name: "Van", id: "577" },
    City { plate: "66", name: "Yozgat", id: "579" },
    City { plate: "67", name: "Zonguldak", id: "580" },
    City { plate: "68", name: "Aksaray", id: "504" },
    City { plate: "69", name: "Bayburt", id: "514" },
    City { plate: "70", name: "Karaman", id: "543" },
    City { plate: "71", name: "Kırıkkale", id: "548" },
    City { plate: "72", name: "Batman", id: "513" },
    City { plate: "73", name: "Şırnak", id: "570" },
    City { plate: "74", name: "Bartın", id: "512" },
    City { plate: "75", name: "Ardahan", id: "508" },
    City { plate: "76", name: "Iğdır", id: "537" },
    City { plate: "77", name: "Yalova", id: "578" },
    City { plate: "78", name: "Karabük", id: "542" },
    City { plate: "79", name: "Kilis", id: "547" },
    City { plate: "80", name: "Osmaniye", id: "563" },
    City { plate: "81", name: "Düzce", id: "526" },
];

/// Looks a city up by plate code; `"6"` and `"06"` both find Ankara.
pub fn city_by_plate(plate: &str) -> Option<&'static City> {
    let plate = plate.trim();
    let number: u32 = plate.parse().ok()?;
    let padded = format!("{:02}", number);
    CITIES.iter().find(|city| city.plate == padded)
}

pub fn city_by_id(id: &str) -> Option<&'static City> {
    CITIES.iter().find(|city| city.id == id)
}

/// City and district chosen from the clock's menu. District lists are
/// fetched in the background whenever the city changes.
#[derive(Debug, Clone)]
pub struct LocationPicker {
    city: &'static City,
    districts: Vec<District>,
    selected: usize,
    loaded_for: Option<&'static str>,
    loading: bool,
    error: Option<String>,
}

impl LocationPicker {
    pub fn new(current: &LocationSettings) -> Self {
        Self {
            city: city_by_id(&current.city.id).unwrap_or(&CITIES[0]),
            districts: vec![District {
                name: current.district.name.clone(),
                id: current.district.id.clone(),
            }],
            selected: 0,
            loaded_for: None,
            loading: false,
            error: None,
        }
    }

    pub fn city(&self) -> &'static City {
        self.city
    }

    pub fn district(&self) -> Option<&District> {
        self.districts.get(self.selected)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn step_city(&mut self, step: isize) {
        let index = CITIES
            .iter()
            .position(|city| city.id == self.city.id)
            .unwrap_or(0) as isize;
        let next = (index + step).rem_euclid(CITIES.len() as isize) as usize;
        self.city = &CITIES[next];
        self.districts.clear();
        self.selected = 0;
        self.loaded_for = None;
        self.loading = false;
        self.error = None;
    }

    pub fn step_district(&mut self, step: isize) {
        if self.districts.is_empty() {
            return;
        }
        let count = self.districts.len() as isize;
        self.selected = (self.selected as isize + step).rem_euclid(count) as usize;
    }

    /// City id whose districts should be fetched now, if any.
    pub fn begin_load(&mut self) -> Option<&'static str> {
        if self.loading || self.loaded_for == Some(self.city.id) {
            return None;
        }
        self.loading = true;
        self.error = None;
        Some(self.city.id)
    }

    /// Results for a city that is no longer selected are dropped.
    pub fn finish_load(&mut self, city_id: &str, result: Result<Vec<District>>) {
        if city_id != self.city.id {
            return;
        }
        self.loading = false;
        match result {
            Ok(districts) => {
                let previous = self.district().map(|district| district.id.clone());
                self.selected = previous
                    .and_then(|id| districts.iter().position(|district| district.id == id))
                    .unwrap_or(0);
                self.districts = districts;
                self.loaded_for = Some(self.city.id);
            }
            Err(err) => self.error = Some(format!("{err:#}")),
        }
    }

    pub fn selection(&self) -> Option<LocationSettings> {
        self.district().map(|district| LocationSettings {
            city: Place {
                name: self.city.name.to_string(),
                id: self.city.id.to_string(),
            },
            district: Place {
                name: district.name.clone(),
                id: district.id.clone(),
            },
        })
    }
}
