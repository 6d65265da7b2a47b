use crate::infra::{load_properties, read_settings};
use clap::Args;
use rentease::error::AppError;
use rentease::marketplace::{
    rank_listings, FeeKind, ListingFilters, ListingQuery, Property, Settings, SettingsError,
};
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Monthly rent to price
    #[arg(long)]
    pub(crate) rent: u64,
    /// Settings JSON file; the built-in fee schedules are used when omitted
    #[arg(long)]
    pub(crate) settings: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct SearchArgs {
    /// JSON array of listings
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Free-text search over location, title, pin code, nearby places and type
    #[arg(long)]
    pub(crate) query: Option<String>,
    #[arg(long)]
    pub(crate) pin_code: Option<String>,
    /// Inclusive rent ceiling
    #[arg(long)]
    pub(crate) max_rent: Option<u64>,
    #[arg(long)]
    pub(crate) bedrooms: Option<u32>,
    /// Also show listings still awaiting approval
    #[arg(long)]
    pub(crate) include_pending: bool,
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let settings = match &args.settings {
        Some(path) => read_settings(path)?,
        None => Settings::default(),
    };
    print!("{}", render_quote(&settings, args.rent)?);
    Ok(())
}

pub(crate) fn run_search(args: SearchArgs) -> Result<(), AppError> {
    let SearchArgs {
        file,
        query,
        pin_code,
        max_rent,
        bedrooms,
        include_pending,
    } = args;

    let properties: Vec<Property> = load_properties(&file)?
        .into_iter()
        .filter(|property| include_pending || property.is_listed())
        .collect();
    let query = ListingQuery::new(query.unwrap_or_default()).with_filters(ListingFilters {
        pin_code: pin_code.filter(|pin| !pin.is_empty()),
        max_rent,
        bedrooms,
    });

    print!("{}", render_search(&rank_listings(&properties, &query)));
    Ok(())
}

/// Fee table for both schedules with the tier covering `rent` marked.
pub(crate) fn render_quote(settings: &Settings, rent: u64) -> Result<String, SettingsError> {
    let mut out = String::new();
    let _ = writeln!(out, "Fees for monthly rent {rent} (UPI: {})", settings.upi_id);

    for (kind, heading) in [
        (FeeKind::Interest, "Interested fee"),
        (FeeKind::VideoRequest, "Video request fee"),
    ] {
        let schedule = settings.fee_schedule(kind)?;
        let charged = schedule.resolve(rent);
        let _ = writeln!(out, "\n{heading}: {charged}");
        let mut matched = false;
        for band in schedule.bands() {
            let covers = !matched && band.max_rent.map_or(true, |max| rent <= max);
            matched |= covers;
            let marker = if covers { "*" } else { " " };
            let _ = writeln!(out, "  {marker} {:<18} {}", band.label(), band.fee);
        }
    }

    Ok(out)
}

pub(crate) fn render_search(listings: &[Property]) -> String {
    let mut out = String::new();
    if listings.is_empty() {
        out.push_str("No listings match.\n");
        return out;
    }

    let _ = writeln!(out, "{} listing(s), most interest first", listings.len());
    for property in listings {
        let _ = writeln!(
            out,
            "- #{} {} | {} | {} BHK | rent {} | {} {} | {} interested",
            property.id,
            property.title,
            property.property_type.label(),
            property.bedrooms,
            property.rent,
            property.location,
            property.pin_code,
            property.interested_tenants,
        );
    }
    out
}
