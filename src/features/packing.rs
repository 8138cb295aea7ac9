//! # Packing List
//!
//! Generates a categorized checklist from a destination type and a few
//! trip options, and tracks which items are packed. The list is stored
//! under the `packingList` key.

use serde::{Deserialize, Serialize};

use crate::core::controller::{Controller, ControllerError, PageContext, PageEvent};
use crate::core::markup::{FormData, escape};
use crate::core::storage::LocalStore;
use crate::core::toast::ToastKind;

pub const STORAGE_KEY: &str = "packingList";

/// Trips longer than this get quantities on clothing.
const LONG_TRIP_DAYS: u32 = 7;

struct Template {
    essentials: &'static [&'static str],
    clothing: &'static [&'static str],
    accessories: &'static [&'static str],
}

fn template(destination: &str) -> Option<Template> {
    let template = match destination {
        "beach" => Template {
            essentials: &[
                "Swimsuit",
                "Sunscreen SPF 50+",
                "Beach towel",
                "Sunglasses",
                "Sun hat",
                "Flip flops",
                "After-sun lotion",
            ],
            clothing: &["Light dresses", "Shorts", "Tank tops", "Light pants", "Evening outfit"],
            accessories: &["Beach bag", "Waterproof phone case", "Snorkel gear"],
        },
        "city" => Template {
            essentials: &[
                "Comfortable walking shoes",
                "Day backpack",
                "Portable charger",
                "City map/guide",
            ],
            clothing: &[
                "Casual outfits",
                "Smart casual outfit",
                "Comfortable jeans",
                "Light jacket",
            ],
            accessories: &["Camera", "Reusable water bottle", "Umbrella"],
        },
        "mountain" => Template {
            essentials: &[
                "Hiking boots",
                "Backpack",
                "Water bottles",
                "First aid kit",
                "Headlamp",
                "Map/GPS",
            ],
            clothing: &[
                "Moisture-wicking shirts",
                "Hiking pants",
                "Warm jacket",
                "Rain jacket",
                "Thermal layers",
            ],
            accessories: &["Trekking poles", "Sunglasses", "Hat", "Gloves"],
        },
        "winter" => Template {
            essentials: &[
                "Winter coat",
                "Thermal underwear",
                "Warm boots",
                "Gloves",
                "Scarf",
                "Winter hat",
            ],
            clothing: &["Sweaters", "Wool socks", "Warm pants", "Layers"],
            accessories: &["Hand warmers", "Lip balm", "Moisturizer"],
        },
        "business" => Template {
            essentials: &["Laptop", "Chargers", "Business cards", "Portfolio/briefcase"],
            clothing: &["Business suits", "Dress shoes", "Dress shirts", "Ties/accessories"],
            accessories: &["Travel steamer", "Shoe polish", "Formal accessories"],
        },
        "adventure" => Template {
            essentials: &[
                "Durable backpack",
                "Multi-tool",
                "First aid kit",
                "Insect repellent",
                "Sunscreen",
            ],
            clothing: &["Quick-dry clothing", "Convertible pants", "Long sleeve shirts", "Bandana"],
            accessories: &["Binoculars", "Head net", "Compass", "Whistle"],
        },
        _ => return None,
    };
    Some(template)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingItem {
    pub id: String,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackingOptions {
    pub destination: String,
    pub duration: u32,
    pub laptop: bool,
    pub camera: bool,
    pub fitness: bool,
    pub kids: bool,
}

impl PackingOptions {
    fn from_form(data: &FormData) -> Self {
        Self {
            destination: data.get("destination").to_string(),
            duration: data.number("duration").unwrap_or(0),
            laptop: data.checked("laptop"),
            camera: data.checked("camera"),
            fitness: data.checked("fitness"),
            kids: data.checked("kids"),
        }
    }
}

/// Build a fresh, fully unchecked list.
pub fn generate_list(options: &PackingOptions) -> Vec<PackingItem> {
    let mut items = Vec::new();
    let mut add = |category: &str, names: &[&str]| {
        for name in names {
            items.push(PackingItem {
                id: uuid::Uuid::new_v4().to_string(),
                category: category.to_string(),
                name: name.to_string(),
                checked: false,
            });
        }
    };

    add(
        "Documents",
        &[
            "Passport",
            "Travel insurance",
            "Tickets/boarding passes",
            "Hotel confirmations",
            "Emergency contacts",
            "Visa (if required)",
        ],
    );
    add(
        "Toiletries",
        &[
            "Toothbrush & toothpaste",
            "Shampoo & conditioner",
            "Soap/body wash",
            "Deodorant",
            "Medications",
            "Contact lenses/glasses",
            "Razor",
            "Feminine hygiene products",
        ],
    );

    if let Some(template) = template(&options.destination) {
        add("Essentials", template.essentials);
        let clothing: Vec<String> = template
            .clothing
            .iter()
            .map(|item| {
                if options.duration > LONG_TRIP_DAYS {
                    format!("{item} ({}x)", options.duration.div_ceil(3))
                } else {
                    item.to_string()
                }
            })
            .collect();
        let clothing: Vec<&str> = clothing.iter().map(String::as_str).collect();
        add("Clothing", &clothing);
        add("Accessories", template.accessories);
    }

    let mut electronics = vec!["Phone charger", "Power adapter", "Headphones"];
    if options.laptop {
        electronics.extend(["Laptop", "Laptop charger", "Mouse"]);
    }
    if options.camera {
        electronics.extend(["Camera", "Camera charger", "Memory cards", "Tripod"]);
    }
    add("Electronics", &electronics);

    if options.fitness {
        add(
            "Fitness",
            &[
                "Workout clothes",
                "Running shoes",
                "Fitness tracker",
                "Water bottle",
                "Resistance bands",
            ],
        );
    }
    if options.kids {
        add(
            "Kids Items",
            &[
                "Diapers/wipes",
                "Baby food/formula",
                "Toys/entertainment",
                "Stroller",
                "Baby carrier",
                "Changing pad",
            ],
        );
    }
    add(
        "Miscellaneous",
        &[
            "Reusable bags",
            "Snacks",
            "Book/entertainment",
            "Travel pillow",
            "Eye mask",
            "Ear plugs",
        ],
    );

    items
}

/// (checked, total, whole percent)
pub fn progress(items: &[PackingItem]) -> (usize, usize, u32) {
    let total = items.len();
    let checked = items.iter().filter(|i| i.checked).count();
    let percent = if total == 0 {
        0
    } else {
        ((checked as f64 / total as f64) * 100.0).round() as u32
    };
    (checked, total, percent)
}

pub struct PackingList {
    store: LocalStore,
    items: Vec<PackingItem>,
}

impl PackingList {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[PackingItem] {
        &self.items
    }

    fn toggle(&mut self, id: &str, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
            return Ok(());
        };
        item.checked = !item.checked;
        self.store.save(STORAGE_KEY, &self.items)?;
        self.render(ctx)
    }

    fn render(&self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        let (checked, total, percent) = progress(&self.items);
        ctx.set_text("packProgress", &format!("{checked} / {total}"))?;
        let bar = ctx.element("packProgressBar")?;
        ctx.doc.set_attr(bar, "value", &percent.to_string());

        if self.items.is_empty() {
            return ctx.set_html(
                "packingList",
                r#"<div class="empty-state"><p>Configure your trip and generate a packing list</p></div>"#,
            );
        }

        // Group by category in first-seen order.
        let mut groups: Vec<(&str, Vec<&PackingItem>)> = Vec::new();
        for item in &self.items {
            match groups.iter_mut().find(|(cat, _)| *cat == item.category) {
                Some((_, members)) => members.push(item),
                None => groups.push((item.category.as_str(), vec![item])),
            }
        }

        let mut markup = String::new();
        for (category, members) in groups {
            markup.push_str(&format!(
                r#"<div class="packing-category"><h4 class="category-title">{}</h4><div class="packing-items">"#,
                escape(category)
            ));
            for item in members {
                let (class, checked) = if item.checked {
                    (" checked", " checked")
                } else {
                    ("", "")
                };
                markup.push_str(&format!(
                    r#"<label class="packing-item{class}" data-action="toggle-item" data-id="{id}"><input type="checkbox"{checked}> <span>{name}</span></label>"#,
                    id = item.id,
                    name = escape(&item.name),
                ));
            }
            markup.push_str("</div></div>");
        }
        ctx.set_html("packingList", &markup)
    }
}

impl Controller for PackingList {
    fn init(&mut self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        self.items = self.store.load(STORAGE_KEY).unwrap_or_default();
        self.render(ctx)
    }

    fn handle(
        &mut self,
        event: PageEvent,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        match event {
            PageEvent::Submit { form, data } if form == "packingForm" => {
                self.items = generate_list(&PackingOptions::from_form(&data));
                self.store.save(STORAGE_KEY, &self.items)?;
                ctx.toast("Packing list generated!", ToastKind::Success);
                self.render(ctx)
            }
            PageEvent::Action { name, value } if name == "toggle-item" => {
                self.toggle(value.as_deref().unwrap_or_default(), ctx)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestPage;

    fn names(items: &[PackingItem], category: &str) -> Vec<String> {
        items
            .iter()
            .filter(|i| i.category == category)
            .map(|i| i.name.clone())
            .collect()
    }

    #[test]
    fn test_short_beach_trip() {
        let items = generate_list(&PackingOptions {
            destination: "beach".into(),
            duration: 5,
            ..Default::default()
        });
        assert!(names(&items, "Clothing").contains(&"Shorts".to_string()));
        assert_eq!(names(&items, "Electronics").len(), 3);
        assert!(names(&items, "Fitness").is_empty());
        assert!(items.iter().all(|i| !i.checked));
    }

    #[test]
    fn test_long_trip_adds_quantities() {
        let items = generate_list(&PackingOptions {
            destination: "city".into(),
            duration: 10,
            ..Default::default()
        });
        assert_eq!(names(&items, "Clothing")[0], "Casual outfits (4x)");
    }

    #[test]
    fn test_options_add_categories() {
        let items = generate_list(&PackingOptions {
            destination: "business".into(),
            duration: 3,
            laptop: true,
            camera: true,
            fitness: true,
            kids: true,
        });
        assert_eq!(names(&items, "Electronics").len(), 10);
        assert_eq!(names(&items, "Fitness").len(), 5);
        assert_eq!(names(&items, "Kids Items").len(), 6);
    }

    #[test]
    fn test_unknown_destination_keeps_general_items() {
        let items = generate_list(&PackingOptions {
            destination: "moon".into(),
            ..Default::default()
        });
        assert!(names(&items, "Essentials").is_empty());
        assert_eq!(names(&items, "Documents").len(), 6);
    }

    #[test]
    fn test_progress_rounds() {
        let mut items = generate_list(&PackingOptions::default());
        assert_eq!(progress(&[]), (0, 0, 0));
        items[0].checked = true;
        let (checked, total, percent) = progress(&items);
        assert_eq!(checked, 1);
        assert_eq!(percent, ((100.0 / total as f64).round()) as u32);
    }

    #[test]
    fn test_generate_and_toggle_persist() {
        let store = LocalStore::in_memory();
        let mut page = TestPage::load("packing");
        let mut list = PackingList::new(store.clone());
        page.init(&mut list);
        assert!(page.text("packingList").contains("generate a packing list"));

        page.submit(
            &mut list,
            "packingForm",
            &[("destination", "winter"), ("duration", "4"), ("travelers", "2"), ("laptop", "on")],
        );
        let total = list.items().len();
        assert_eq!(page.text("packProgress"), format!("0 / {total}"));
        assert!(page.text("packingList").contains("Hand warmers"));
        assert!(page.text("packingList").contains("Laptop charger"));

        let id = list.items()[0].id.clone();
        page.action(&mut list, "toggle-item", Some(&id));
        assert_eq!(page.text("packProgress"), format!("1 / {total}"));

        let saved: Vec<PackingItem> = store.load(STORAGE_KEY).unwrap();
        assert!(saved[0].checked);

        let mut reopened = PackingList::new(store);
        let mut page = TestPage::load("packing");
        page.init(&mut reopened);
        assert_eq!(page.text("packProgress"), format!("1 / {total}"));
    }
}
