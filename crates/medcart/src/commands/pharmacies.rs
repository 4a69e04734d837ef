//! Pharmacy command handlers.

use tabled::Tabled;

use medcart_core::form::PharmacySchema;
use medcart_core::mutation::requests;
use medcart_core::{FormValues, Pharmacy, Storefront, endpoints};

use crate::cli::{GlobalOpts, PharmaciesArgs, PharmaciesCommand, PharmacyFields};
use crate::error::CliError;
use crate::output;

use super::util;

const DRAFT: &str = "pharmacy-create";

#[derive(Tabled)]
struct PharmacyRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "Pharmacist")]
    pharmacist: String,
    #[tabled(rename = "Hours")]
    hours: String,
}

impl From<&Pharmacy> for PharmacyRow {
    fn from(p: &Pharmacy) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            city: p.city.clone().unwrap_or_default(),
            pharmacist: p.pharmacist_name.clone().unwrap_or_default(),
            hours: p.operational_hours.clone().unwrap_or_default(),
        }
    }
}

fn detail(p: &Pharmacy) -> String {
    let mut lines = vec![
        format!("ID:          {}", p.id),
        format!("Name:        {}", p.name),
        format!("Address:     {}", p.address),
        format!("City:        {}", p.city.as_deref().unwrap_or("-")),
        format!("Pharmacist:  {}", p.pharmacist_name.as_deref().unwrap_or("-")),
        format!("Hours:       {}", p.operational_hours.as_deref().unwrap_or("-")),
    ];
    if let (Some(lat), Some(lng)) = (p.latitude, p.longitude) {
        lines.push(format!("Location:    {lat:.5}, {lng:.5}"));
    }
    lines.join("\n")
}

fn provided(fields: PharmacyFields) -> Vec<(&'static str, String)> {
    [
        ("name", fields.name),
        ("address", fields.address),
        ("city", fields.city),
        ("pharmacist_name", fields.pharmacist_name),
        ("phone", fields.phone),
        ("operational_hours", fields.operational_hours),
        ("latitude", fields.latitude),
        ("longitude", fields.longitude),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.map(|v| (field, v)))
    .collect()
}

pub async fn handle(
    store: &Storefront,
    args: PharmaciesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PharmaciesCommand::List { page } => {
            let pharmacies: Vec<Pharmacy> =
                util::load_list(store, endpoints::pharmacies(page)).await?;
            let out = output::render_list(
                &global.output,
                &pharmacies,
                |x| PharmacyRow::from(x),
                |p| p.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PharmaciesCommand::Get { id } => {
            let pharmacy: Pharmacy = util::load(store, endpoints::pharmacy(id))
                .await
                .map_err(|e| util::not_found(e, "pharmacy", id, "pharmacies list"))?;
            let out = output::render_single(&global.output, &pharmacy, detail, |p| {
                p.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // Fields given on earlier runs are kept in a draft until the
        // pharmacy is created, so a long form can be filled in pieces.
        PharmaciesCommand::Create(fields) => {
            if fields.fresh {
                if let Some(drafts) = store.drafts() {
                    drafts.clear(DRAFT)?;
                }
            }
            let mut form = store.form(PharmacySchema, FormValues::new(), Some(DRAFT))?;
            for (field, value) in provided(fields) {
                form.set_field(field, value);
            }

            let created = util::submit_form(
                store,
                &mut form,
                |input| requests::create_pharmacy(&input),
                global,
            )
            .await;
            if matches!(created, Err(CliError::InvalidForm { .. })) && store.drafts().is_some() {
                tracing::info!("pharmacy draft kept; rerun with the missing fields");
            }
            if let Some(ref data) = created? {
                output::print_output(&util::id_of(data), global.quiet);
            }
            Ok(())
        }
    }
}
