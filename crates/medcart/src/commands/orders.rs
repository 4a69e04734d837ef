//! Order command handlers.

use tabled::Tabled;

use medcart_core::mutation::requests;
use medcart_core::{Order, Storefront, endpoints};

use crate::cli::{GlobalOpts, OrdersArgs, OrdersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Items")]
    items: u32,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Placed")]
    placed: String,
}

impl From<&Order> for OrderRow {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id,
            status: o.status.to_string(),
            items: o.item_count(),
            total: output::rupiah(o.total),
            placed: o
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

fn detail(o: &Order) -> String {
    let mut lines = vec![
        format!("ID:      {}", o.id),
        format!("Status:  {}", o.status),
        format!("Total:   {}", output::rupiah(o.total)),
    ];
    if let Some(placed) = o.created_at {
        lines.push(format!("Placed:  {}", placed.to_rfc3339()));
    }
    for item in &o.items {
        lines.push(format!(
            "  {} x{} @ {}",
            item.name,
            item.quantity,
            output::rupiah(item.price)
        ));
    }
    lines.join("\n")
}

pub async fn handle(
    store: &Storefront,
    args: OrdersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        OrdersCommand::List { status, page } => {
            let orders: Vec<Order> = util::load_list(store, endpoints::orders(status, page)).await?;
            let out = output::render_list(
                &global.output,
                &orders,
                |x| OrderRow::from(x),
                |o| o.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OrdersCommand::Get { id } => {
            let order: Order = util::load(store, endpoints::order(id))
                .await
                .map_err(|e| util::not_found(e, "order", id, "orders list"))?;
            let out =
                output::render_single(&global.output, &order, detail, |o| o.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OrdersCommand::SetStatus { id, status } => {
            util::perform(
                store,
                &requests::update_order_status(id, status),
                &format!("Order {id} is now {status}"),
                global,
            )
            .await?;
            Ok(())
        }
    }
}
