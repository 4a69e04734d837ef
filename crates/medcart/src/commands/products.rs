//! Product command handlers.

use tabled::Tabled;

use medcart_core::form::ProductSchema;
use medcart_core::mutation::requests;
use medcart_core::{FormValues, Product, Storefront, endpoints};

use crate::cli::{GlobalOpts, ProductFields, ProductsArgs, ProductsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Stock")]
    stock: u32,
    #[tabled(rename = "Rx")]
    prescription: &'static str,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            price: output::rupiah(p.price),
            stock: p.stock,
            prescription: if p.requires_prescription { "yes" } else { "" },
        }
    }
}

fn detail(p: &Product) -> String {
    [
        format!("ID:           {}", p.id),
        format!("Name:         {}", p.name),
        format!("Description:  {}", p.description.as_deref().unwrap_or("-")),
        format!("Price:        {}", output::rupiah(p.price)),
        format!("Stock:        {}", p.stock),
        format!(
            "Category:     {}",
            p.category_id.map_or_else(|| "-".into(), |c| c.to_string())
        ),
        format!("Prescription: {}", p.requires_prescription),
    ]
    .join("\n")
}

fn form_values(fields: ProductFields) -> FormValues {
    let mut values = FormValues::new();
    values.set("name", fields.name);
    values.set("description", fields.description);
    values.set("price", fields.price);
    values.set("stock", fields.stock);
    values.set("category_id", fields.category);
    values.set("requires_prescription", fields.prescription.to_string());
    values
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    store: &Storefront,
    args: ProductsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProductsCommand::List(page) => {
            let key = match page.category {
                Some(category) => endpoints::products_in_category(category, page.page),
                None => endpoints::products(page.page),
            };
            let products: Vec<Product> = util::load_list(store, key).await?;
            let out = output::render_list(
                &global.output,
                &products,
                |x| ProductRow::from(x),
                |p| p.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Get { id } => {
            let product: Product = util::load(store, endpoints::product(id))
                .await
                .map_err(|e| util::not_found(e, "product", id, "products list"))?;
            let out = output::render_single(&global.output, &product, detail, |p| {
                p.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Create(fields) => {
            let mut form = store.form(ProductSchema, form_values(fields), None)?;
            let created = util::submit_form(
                store,
                &mut form,
                |input| requests::create_product(&input),
                global,
            )
            .await?;
            if let Some(ref data) = created {
                output::print_output(&util::id_of(data), global.quiet);
            }
            Ok(())
        }

        ProductsCommand::Update { id, fields } => {
            let mut form = store.form(ProductSchema, form_values(fields), None)?;
            util::submit_form(
                store,
                &mut form,
                |input| requests::update_product(id, &input),
                global,
            )
            .await
            .map_err(|e| util::not_found(e, "product", id, "products list"))?;
            Ok(())
        }

        ProductsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete product {id}?"), global, "products delete")? {
                return Ok(());
            }
            util::perform(
                store,
                &requests::delete_product(id),
                &format!("Product {id} deleted"),
                global,
            )
            .await?;
            Ok(())
        }
    }
}
