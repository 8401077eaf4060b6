use super::{EditForm, Outcome, ScreenStore};
use crate::{
    area::{AreaApi, AreaId},
    Result,
};
use tracing::info;
use uuid::Uuid;

// Every call follows the same shape: take a token under the store lock,
// release it while the backend works, then hand the result back with the
// token so a superseded response can be dropped.

pub async fn load_areas(store: &ScreenStore, api: &dyn AreaApi, id: Uuid) -> Result<Outcome> {
    let token = store.with(id, |it| it.begin_list())?;
    let res = api.get_areas().await;
    store.with(id, |it| it.list_loaded(token, res))
}

pub async fn select_area(
    store: &ScreenStore,
    api: &dyn AreaApi,
    id: Uuid,
    area_id: AreaId,
) -> Result<Outcome> {
    let token = store.with(id, |it| it.begin_select())??;
    let res = api.get_area_by_id(area_id).await;
    store.with(id, |it| it.area_loaded(token, res))
}

pub async fn submit(
    store: &ScreenStore,
    api: &dyn AreaApi,
    id: Uuid,
    form: &EditForm,
) -> Result<Outcome> {
    let (token, area_id, update) = store.with(id, |it| it.begin_submit(form))??;
    info!(screen = %id, area_id, vertices = update.geometry.ring().len(), "Submitting area");
    let res = api.update_area(area_id, update).await;
    store.with(id, |it| it.submit_finished(token, res))
}

pub async fn delete(store: &ScreenStore, api: &dyn AreaApi, id: Uuid) -> Result<Outcome> {
    let (token, area_id) = store.with(id, |it| it.begin_delete())??;
    info!(screen = %id, area_id, "Deleting area");
    let res = api.delete_area_by_id(area_id).await;
    store.with(id, |it| it.delete_finished(token, res))
}
