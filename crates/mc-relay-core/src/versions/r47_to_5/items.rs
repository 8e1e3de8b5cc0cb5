//! Item id fixups between 1.7.6 and 1.8 inventories.

use mc_relay_proto::item::ItemStack;

/// Block-form ids a 1.7 server may hand out that 1.8 clients cannot
/// render as items. Mapped to the matching item form; identity otherwise.
const ITEM_REPLACEMENTS: &[(i16, i16)] = &[
    (26, 355),  // bed block -> bed
    (62, 61),   // lit furnace -> furnace
    (63, 323),  // standing sign -> sign
    (74, 73),   // lit redstone ore -> redstone ore
    (93, 356),  // repeater block (off) -> repeater
    (94, 356),  // repeater block (on) -> repeater
];

pub(super) fn remap_item(mut item: ItemStack) -> ItemStack {
    if let Some(&(_, to)) = ITEM_REPLACEMENTS.iter().find(|(from, _)| *from == item.id) {
        item.id = to;
        item.damage = 0;
    }
    item
}

/// Whether the id exists in the 1.7.6 creative inventory. Blocks, items
/// and music discs; everything else is rejected by the server.
pub(super) fn is_creative_item(id: i16) -> bool {
    matches!(id, 1..=175 | 256..=407 | 2256..=2267)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_forms_become_items() {
        let bed = remap_item(ItemStack::new(26, 1, 3, None));
        assert_eq!(bed.id, 355);
        assert_eq!(bed.damage, 0);

        let stone = remap_item(ItemStack::new(1, 64, 0, None));
        assert_eq!(stone.id, 1);
    }

    #[test]
    fn creative_ranges() {
        assert!(is_creative_item(1));
        assert!(is_creative_item(175));
        assert!(is_creative_item(276));
        assert!(is_creative_item(2267));
        assert!(!is_creative_item(0));
        assert!(!is_creative_item(200));
        assert!(!is_creative_item(408));
    }
}
