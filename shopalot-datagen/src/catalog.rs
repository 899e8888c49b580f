//! Fixed literal pools that generated records draw from.

pub const PHONE_TYPES: [&str; 3] = ["HOME", "OFFICE", "MOBILE"];

pub const STORE_NAMES: [&str; 40] = [
    "Machias Mainway",
    "Casey's Cove Convenience Store",
    "Maay Convenient Inc",
    "Cefco",
    "Mapco Express",
    "Plaid Pantry",
    "Jackson Food Store",
    "Rutters Farm Store",
    "Irving Oil Corp",
    "Hillcrest",
    "Cubbys",
    "7-Eleven",
    "Service Champ",
    "Express Mart Stores",
    "Baum's Mercantile",
    "Border Station",
    "Country Market",
    "Golden Spike Travel Plaza",
    "Wesco Oil CO",
    "Cracker Barrel Stores Inc",
    "Elnemr Enterprises Inc",
    "Sheetz",
    "Pump-N-Pantry Of NY",
    "Spaceway Oil CO",
    "6-Twelve Convenient-Mart Inc",
    "Dandy Mini Mart",
    "Stripes Llc",
    "Plaid Pantries Inc",
    "Quick Chek Food Stores",
    "Victory Marketing Llc",
    "Beasley Enterprises Inc",
    "Lil' Champ",
    "Pit Row",
    "Popeye Shell Superstop",
    "Mapco",
    "Sunset Foods",
    "Simonson Market",
    "Fasmart",
    "Super Quik Inc",
    "Jim's Quick Stop",
];

pub const PRODUCT_CATEGORIES: [&str; 16] = [
    "Baby Care",
    "Beverages",
    "Bread & Bakery",
    "Breakfast & Cereal",
    "Canned Goods & Soups",
    "Condiments, Spice, & Bake",
    "Cookies, Snacks, & Candy",
    "Dairy, Eggs, & Cheese",
    "Deli",
    "Frozen Foods",
    "Fruits & Vegetables",
    "Grains, Pasta, & Sides",
    "Meat & Seafood",
    "Paper, Cleaning, & Home",
    "Personal Care & Health",
    "Pet Care",
];

/// Product ids are drawn from `0..=MAX_PRODUCT_ID` and rendered with
/// [`PRODUCT_ID_WIDTH`] digits.
pub const MAX_PRODUCT_ID: u32 = 541;
pub const PRODUCT_ID_WIDTH: usize = 3;

/// Floor applied to every list and sale price.
pub const MIN_PRICE: f64 = 0.99;
pub const MAX_LIST_PRICE: f64 = 50.0;

pub const MAX_PHONE_NUMBER_LEN: usize = 20;
