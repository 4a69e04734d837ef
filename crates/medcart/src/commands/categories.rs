//! Category command handlers.

use tabled::Tabled;

use medcart_core::form::CategorySchema;
use medcart_core::mutation::requests;
use medcart_core::{Category, FormValues, Storefront, endpoints};

use crate::cli::{CategoriesArgs, CategoriesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Image")]
    image: String,
}

impl From<&Category> for CategoryRow {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            image: c.image_url.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(
    store: &Storefront,
    args: CategoriesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CategoriesCommand::List => {
            let categories: Vec<Category> = util::load_list(store, endpoints::categories()).await?;
            let out = output::render_list(
                &global.output,
                &categories,
                |x| CategoryRow::from(x),
                |c| c.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CategoriesCommand::Create { name, image_url } => {
            let mut values = FormValues::new();
            values.set("name", name);
            values.set("image_url", image_url.unwrap_or_default());

            let mut form = store.form(CategorySchema, values, None)?;
            let created = util::submit_form(
                store,
                &mut form,
                |input| requests::create_category(&input),
                global,
            )
            .await?;
            if let Some(ref data) = created {
                output::print_output(&util::id_of(data), global.quiet);
            }
            Ok(())
        }

        CategoriesCommand::Delete { id } => {
            if !util::confirm(
                &format!("Delete category {id}? Products keep their data but lose the category."),
                global,
                "categories delete",
            )? {
                return Ok(());
            }
            util::perform(
                store,
                &requests::delete_category(id),
                &format!("Category {id} deleted"),
                global,
            )
            .await?;
            Ok(())
        }
    }
}
